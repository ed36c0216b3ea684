#![forbid(unsafe_code)]

use std::io::IsTerminal;
use std::process::exit;

use clap::{ArgAction, ArgGroup, Parser};
use tracing::error;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::prelude::*;

mod commands;

use crate::commands::Subcommand;

#[derive(Parser)]
#[clap(version, author, about, group = ArgGroup::new("output"))]
struct Opt {
    /// Log more: `-v` shows each executed instruction, `-vv` the registers and stack after each one
    #[clap(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Always color the logs, even when stderr is not a terminal
    #[clap(short = 'c', long, global = true, group = "output")]
    color: bool,

    /// Never color the logs
    #[clap(short = 'C', long, global = true, group = "output")]
    no_color: bool,

    /// Emit logs as JSON lines on stderr
    #[clap(short, long, global = true, group = "output")]
    json: bool,

    #[clap(subcommand)]
    command: Subcommand,
}

impl Opt {
    /// Directives used when `RUST_LOG` is unset
    const fn default_directives(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "octet_emulator=debug,octet=debug,info",
            2 => "octet_emulator=trace,octet=trace,info",
            3 => "octet_emulator=trace,octet=trace,debug",
            4..=u8::MAX => "trace",
        }
    }

    fn ansi(&self) -> bool {
        match (self.color, self.no_color) {
            (true, _) => true,
            (_, true) => false,
            _ => std::io::stderr().is_terminal(),
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_directives()))
    }

    /// Install the global subscriber. Stdout stays reserved for command output.
    fn init_tracing(&self) {
        let registry = tracing_subscriber::Registry::default().with(self.filter());

        if self.json {
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr);
            registry.with(layer).init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .without_time()
                .with_ansi(self.ansi())
                .with_target(false)
                .with_writer(std::io::stderr);
            registry.with(layer).init();
        }
    }
}

fn main() {
    let opt = Opt::parse();
    opt.init_tracing();

    if let Err(e) = opt.command.exec() {
        error!("{e:#}");
        exit(1);
    }
}
