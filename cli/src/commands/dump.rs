use camino::Utf8PathBuf;
use clap::{Parser, ValueHint};
use octet_emulator::runtime::disassemble;
use tracing::debug;

use super::{load_image, Format};

#[derive(Parser, Debug)]
pub struct DumpOpt {
    /// Program image
    #[clap(value_parser, value_hint = ValueHint::FilePath)]
    input: Utf8PathBuf,

    /// How the image is stored
    #[clap(short, long, value_enum, default_value_t = Format::Auto)]
    format: Format,
}

impl DumpOpt {
    pub fn exec(self) -> anyhow::Result<()> {
        let image = load_image(&self.input, self.format)?;

        // Stop at the trailing padding, but keep the operand of the last instruction
        let end = image.code().len();
        debug!(end, "Disassembling program");
        for (address, instruction) in disassemble(image.as_bytes())
            .take_while(|(address, _)| usize::from(*address) < end)
        {
            println!("{address:#04x}  {instruction}");
        }

        Ok(())
    }
}
