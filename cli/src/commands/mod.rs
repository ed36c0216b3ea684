use anyhow::Context;
use camino::Utf8Path;
use clap::ValueEnum;
use octet_emulator::Image;
use tracing::{debug, info};

mod completion;
mod dump;
mod run;

#[derive(clap::Subcommand, Debug)]
pub enum Subcommand {
    /// Load and run a program image
    Run(self::run::RunOpt),

    /// Print the instructions of a program image
    Dump(self::dump::DumpOpt),

    /// Generate shell completions
    Completion(self::completion::CompletionOpt),
}

impl Subcommand {
    /// Run a subcommand
    pub fn exec(self) -> anyhow::Result<()> {
        match self {
            Self::Run(opt) => opt.exec(),
            Self::Dump(opt) => opt.exec(),
            Self::Completion(opt) => opt.exec(),
        }
    }
}

/// How a program image is stored on disk
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// `hex` for `.hex` and `.txt` files, `binary` otherwise
    Auto,

    /// Raw bytes, loaded at address 0
    Binary,

    /// Text listing of hexadecimal bytes
    Hex,
}

impl Format {
    fn resolve(self, path: &Utf8Path) -> Self {
        match (self, path.extension()) {
            (Self::Auto, Some("hex" | "txt")) => Self::Hex,
            (Self::Auto, _) => Self::Binary,
            (format, _) => format,
        }
    }
}

/// Read a program image from a file
fn load_image(path: &Utf8Path, format: Format) -> anyhow::Result<Image> {
    let format = format.resolve(path);
    info!(%path, ?format, "Reading program");

    let image = if format == Format::Hex {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("could not read {path}"))?;

        match Image::parse_hex(&source) {
            Ok(image) => image,
            Err(e) => {
                let report = miette::Report::new(e).with_source_code(
                    miette::NamedSource::new(path.as_str(), source),
                );
                eprintln!("{report:?}");
                anyhow::bail!("could not parse {path}");
            }
        }
    } else {
        let bytes = std::fs::read(path).with_context(|| format!("could not read {path}"))?;
        Image::from_bytes(bytes)?
    };

    debug!(len = image.len(), "Loaded program image");
    Ok(image)
}
