use tracing::{debug, info, warn};

use crate::constants as C;

use super::{Bus, Computer, Exception};

/// How a [`Driver`] run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The processor set its HALT flag
    Halted { steps: usize },

    /// Too many faults in a row
    TripleFault { steps: usize, last: Exception },

    /// The step budget ran out before the processor halted
    StepLimit { steps: usize },
}

/// Runs a [`Computer`] until it halts, with bounds the processor itself does not have
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Driver {
    max_faults: usize,
    max_steps: Option<usize>,
}

impl Default for Driver {
    fn default() -> Self {
        Self {
            max_faults: C::TRIPLE_FAULT,
            max_steps: None,
        }
    }
}

impl Driver {
    /// Number of consecutive faults before giving up. Zero is treated as one.
    #[must_use]
    pub fn with_max_faults(mut self, max_faults: usize) -> Self {
        self.max_faults = max_faults.max(1);
        self
    }

    /// Maximum number of steps, faulty ones included
    #[must_use]
    pub fn with_max_steps(mut self, max_steps: Option<usize>) -> Self {
        self.max_steps = max_steps;
        self
    }

    #[tracing::instrument(skip(computer))]
    pub fn run<M: Bus>(&self, computer: &mut Computer<M>) -> Outcome {
        let mut steps = 0;
        let mut faults = 0;

        while computer.ready() {
            if self.max_steps.is_some_and(|max| steps >= max) {
                info!(steps, "Step limit reached");
                return Outcome::StepLimit { steps };
            }

            steps += 1;
            match computer.step() {
                Ok(()) => faults = 0,
                Err(e) => {
                    faults += 1;
                    warn!(error = &e as &dyn std::error::Error, faults, "Fault");
                    if faults >= self.max_faults {
                        warn!(steps, "Processor experienced a triple fault");
                        return Outcome::TripleFault { steps, last: e };
                    }
                }
            }
        }

        debug!(steps, "Processor halted");
        Outcome::Halted { steps }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::super::{Config, InvalidOpcodePolicy, Memory};
    use super::*;

    fn strict(program: &[C::Word]) -> Computer {
        Computer::new(Memory::with_image(program).unwrap()).with_config(Config {
            on_invalid_opcode: InvalidOpcodePolicy::Fault,
            ..Config::default()
        })
    }

    #[test]
    fn halts_test() {
        let mut computer = Computer::new(Memory::with_image(&[0x01, 0x02, 0x00]).unwrap());
        let outcome = Driver::default().run(&mut computer);
        assert_eq!(outcome, Outcome::Halted { steps: 2 });
        assert_eq!(computer.registers.ax, 2);
    }

    #[test]
    fn already_halted_test() {
        let mut computer = Computer::default();
        computer.run().unwrap();
        let outcome = Driver::default().run(&mut computer);
        assert_eq!(outcome, Outcome::Halted { steps: 0 });
    }

    #[test]
    fn triple_fault_test() {
        let mut computer = strict(&[0x01, 0x02, 0xEE]);
        let outcome = Driver::default().run(&mut computer);
        assert_eq!(
            outcome,
            Outcome::TripleFault {
                steps: 4,
                last: Exception::InvalidInstruction {
                    opcode: 0xEE,
                    address: 2
                }
            }
        );
        assert!(computer.ready());
        assert_eq!(computer.registers.ip, 2);
    }

    #[test]
    fn single_fault_budget_test() {
        let mut computer = strict(&[0xEE]);
        let outcome = Driver::default().with_max_faults(0).run(&mut computer);
        assert!(matches!(outcome, Outcome::TripleFault { steps: 1, .. }));
    }

    #[test]
    fn step_limit_test() {
        // JUMP_ADDR 0, forever
        let mut computer = Computer::new(Memory::with_image(&[0x17, 0x00]).unwrap());
        let outcome = Driver::default()
            .with_max_steps(Some(100))
            .run(&mut computer);
        assert_eq!(outcome, Outcome::StepLimit { steps: 100 });
        assert_eq!(computer.cycles, 100);
        assert_eq!(computer.registers.ip, 0);
    }

    #[test]
    fn step_limit_not_reached_test() {
        let mut computer = Computer::new(Memory::with_image(&[0x02, 0x00]).unwrap());
        let outcome = Driver::default().with_max_steps(Some(2)).run(&mut computer);
        assert_eq!(outcome, Outcome::Halted { steps: 2 });
    }
}
