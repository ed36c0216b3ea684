use camino::Utf8PathBuf;
use clap::{ArgAction, Parser, ValueHint};
use octet_emulator::constants::TRIPLE_FAULT;
use octet_emulator::runtime::InvalidOpcodePolicy;
use octet_emulator::{Computer, Config, Driver, Outcome};
use tracing::{debug, info};

use super::{load_image, Format};

#[derive(Parser, Debug)]
pub struct RunOpt {
    /// Program image
    #[clap(value_parser, value_hint = ValueHint::FilePath)]
    input: Utf8PathBuf,

    /// How the image is stored
    #[clap(short, long, value_enum, default_value_t = Format::Auto)]
    format: Format,

    /// Stop after this many instructions
    #[clap(long)]
    max_steps: Option<usize>,

    /// Consecutive faults before giving up
    #[clap(long, default_value_t = TRIPLE_FAULT)]
    max_faults: usize,

    /// Report invalid opcodes as faults instead of halting
    #[clap(long, action = ArgAction::SetTrue)]
    strict: bool,

    /// Make JUMP_LEQU behave like JUMP_NEQU
    #[clap(long, action = ArgAction::SetTrue)]
    lequ_compat: bool,
}

impl RunOpt {
    fn config(&self) -> Config {
        Config {
            on_invalid_opcode: if self.strict {
                InvalidOpcodePolicy::Fault
            } else {
                InvalidOpcodePolicy::Halt
            },
            lequ_compat: self.lequ_compat,
        }
    }

    pub fn exec(self) -> anyhow::Result<()> {
        let image = load_image(&self.input, self.format)?;

        debug!(config = ?self.config(), "Building computer");
        let mut computer = Computer::new(image.to_memory()?).with_config(self.config());
        let driver = Driver::default()
            .with_max_faults(self.max_faults)
            .with_max_steps(self.max_steps);

        info!("Running program");
        let outcome = driver.run(&mut computer);

        info!(registers = %computer.registers, cycles = computer.cycles, "End of program");
        println!("{}", computer.registers);

        match outcome {
            Outcome::Halted { .. } => Ok(()),
            Outcome::TripleFault { last, .. } => {
                anyhow::bail!("processor experienced a triple fault ({last})")
            }
            Outcome::StepLimit { steps } => {
                anyhow::bail!("program did not halt within {steps} steps")
            }
        }
    }
}
