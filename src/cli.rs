//! CLI argument parsing and logging setup.
//!
//! Every flag is optional: with none given the tool behaves as the
//! interactive console program operators double-click.
use crate::pipeline::EntryPoint;
use crate::session::SessionOptions;
use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "efi",
    version,
    about = "Fiscalize an invoice by chaining the EFI stage tools",
    after_help = "Stage tools (extract, bridge, iic, dsig, reg, keep, qrc, pdf) and config.json\nare looked up in the working directory.\n\nExamples:\n  efi\n  efi --mode automatic --input invoices/inv.pdf\n  efi --mode manual --input inv.bridge -v"
)]
pub struct RootArgs {
    /// Directory holding config.json and the stage tools (default: executable's directory)
    #[arg(long, value_name = "DIR")]
    pub workdir: Option<PathBuf>,

    /// Entry point to run instead of asking through the menu
    #[arg(long, value_enum)]
    pub mode: Option<EntryPoint>,

    /// Invoice (automatic) or .bridge file (manual) instead of prompting
    #[arg(long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Log line format on stderr
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl RootArgs {
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            entry: self.mode,
            input: self.input.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "efi=warn",
        1 => "efi=info",
        2 => "efi=debug",
        _ => "efi=trace",
    }
}

/// Install the global tracing subscriber. `RUST_LOG` overrides `-v`.
pub fn init_tracing(args: &RootArgs) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(args.verbose)));

    match args.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
