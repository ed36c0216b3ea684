use tracing::{debug, trace};

use crate::constants as C;

mod driver;
mod exception;
mod instructions;
mod memory;
mod registers;

pub use self::driver::{Driver, Outcome};
pub use self::exception::Exception;
pub use self::instructions::{disassemble, Disassembler, Instruction, Opcode};
pub use self::memory::{Bus, Memory, MemoryError};
pub use self::registers::{Registers, StatusRegister};

type Result<T> = std::result::Result<T, Exception>;

/// What to do when the processor decodes a byte outside of the instruction set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InvalidOpcodePolicy {
    /// Silently set the HALT flag
    #[default]
    Halt,

    /// Report an [`Exception::InvalidInstruction`] and leave the registers untouched
    Fault,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Config {
    pub on_invalid_opcode: InvalidOpcodePolicy,

    /// Make `JUMP_LEQU` behave like `JUMP_NEQU`, as some existing programs expect
    pub lequ_compat: bool,
}

/// The processor, bound to a single memory bank
pub struct Computer<M: Bus = Memory> {
    pub registers: Registers,
    pub memory: M,

    /// Number of executed instructions
    pub cycles: usize,

    config: Config,
}

impl Default for Computer {
    fn default() -> Self {
        Self::new(Memory::default())
    }
}

impl<M: Bus> std::fmt::Debug for Computer<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Computer {{ registers: {:?}, cycles: {}, memory: [...] }}",
            self.registers, self.cycles
        )
    }
}

impl<M: Bus> Computer<M> {
    /// Build a processor with all registers zeroed
    #[must_use]
    pub fn new(memory: M) -> Self {
        Self {
            registers: Registers::default(),
            memory,
            cycles: 0,
            config: Config::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether the processor can execute another instruction
    #[must_use]
    pub fn ready(&self) -> bool {
        !self.registers.halted()
    }

    /// Load the byte under the instruction pointer in the instruction register
    pub fn fetch(&mut self) {
        self.registers.ir = self.memory.read(self.registers.ip);
    }

    /// Execute the instruction held in the instruction register, then move to the next one
    ///
    /// # Errors
    ///
    /// Fails if the opcode is not part of the instruction set and the processor is configured to
    /// fault on those. The registers are left as they were.
    pub fn decode(&mut self) -> Result<()> {
        let opcode = Opcode::from(self.registers.ir);
        debug!(ip = self.registers.ip, %opcode, "Executing instruction");
        opcode.execute(self)?;

        if self.ready() {
            self.registers.ip = self.registers.ip.wrapping_add(1);
        }

        self.cycles += 1;
        trace!("Register state {}", self.registers);
        Ok(())
    }

    /// Run one fetch-decode-execute cycle. Does nothing once the processor is halted.
    ///
    /// # Errors
    ///
    /// See [`Computer::decode`]
    #[tracing::instrument(skip(self), level = "debug")]
    pub fn step(&mut self) -> Result<()> {
        if !self.ready() {
            debug!("Processor is halted");
            return Ok(());
        }

        self.fetch();
        self.decode()
    }

    /// Step until the processor halts. This never returns on a program that loops forever, use
    /// a [`Driver`] to bound the execution.
    ///
    /// # Errors
    ///
    /// Stops on the first exception
    #[tracing::instrument(skip(self))]
    pub fn run(&mut self) -> Result<()> {
        while self.ready() {
            self.step()?;
        }

        Ok(())
    }

    fn halt(&mut self) {
        debug!(ip = self.registers.ip, "Halting");
        self.registers.flags.insert(StatusRegister::HALT);
    }

    /// Move to the operand byte and read it
    fn fetch_operand(&mut self) -> C::Word {
        self.registers.ip = self.registers.ip.wrapping_add(1);
        self.memory.read(self.registers.ip)
    }

    /// Read the target address and point right before it
    fn jump(&mut self) {
        let target = self.fetch_operand();
        debug!("Jumping to address {:#04x}", target);
        self.registers.ip = target.wrapping_sub(1);
    }

    fn jump_if(&mut self, condition: bool) {
        if condition {
            self.jump();
        } else {
            // Skip the operand
            self.registers.ip = self.registers.ip.wrapping_add(1);
        }
    }

    fn push(&mut self, value: C::Word) {
        trace!(sp = self.registers.sp, value, "push");
        self.memory.write(self.registers.sp, value);
        self.registers.sp = self.registers.sp.wrapping_sub(1);
    }

    fn pop(&mut self) -> C::Word {
        self.registers.sp = self.registers.sp.wrapping_add(1);
        let value = self.memory.read(self.registers.sp);
        trace!(sp = self.registers.sp, value, "pop");
        value
    }
}
