use clap::{Args, Subcommand};
use std::path::PathBuf;

use osod_link::DEFAULT_BAUD;
use osod_monitor::DEFAULT_PORT;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod kinds;
pub mod monitor;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open the serial link and print decoded telemetry until interrupted.
    Monitor(MonitorArgs),
    /// Decode a single tag-prefixed payload given as hex.
    Decode(DecodeArgs),
    /// List the known payload kinds and their layouts.
    Kinds(KindsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Monitor(args) => monitor::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Kinds(args) => kinds::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Serial port to open.
    #[arg(long, short = 'p', default_value = DEFAULT_PORT, env = "OSOD_PORT")]
    pub port: String,
    /// Baud rate.
    #[arg(long, short = 'b', default_value_t = DEFAULT_BAUD, env = "OSOD_BAUD")]
    pub baud: u32,
    /// Append each payload as a CSV line to `<DIR>/<kind>.log`.
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
    /// Delay between attempts to open an unavailable port (e.g. 1s, 500ms).
    #[arg(long, default_value = "1s")]
    pub retry_interval: String,
    /// Give up after N failed attempts to open the port. Default: retry forever.
    #[arg(long)]
    pub max_attempts: Option<u32>,
    /// Exit after printing N payloads.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Hex bytes, tag first. Whitespace-separated groups are joined.
    #[arg(required = true, num_args = 1..)]
    pub hex: Vec<String>,
}

#[derive(Args, Debug, Default)]
pub struct KindsArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
