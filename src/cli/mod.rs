//! Command-line surface of the `alamgu` binary (feature `cli`).

pub mod get_address;

use clap::{Parser, Subcommand};

pub use get_address::GetAddressArgs;

#[derive(Parser, Debug)]
#[clap(name = "alamgu", version, about = "Talk to Alamgu apps on a Ledger device")]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Get address for <path> from ledger
    #[clap(name = "getAddress")]
    GetAddress(GetAddressArgs),
}

impl Cli {
    /// Whether the chosen command asked for APDU tracing.
    pub fn verbose(&self) -> bool {
        match &self.command {
            Commands::GetAddress(args) => args.verbose,
        }
    }
}

/// Logs go to stderr so they never mix with command output. `RUST_LOG`
/// overrides the default level.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}
