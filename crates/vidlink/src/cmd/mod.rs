use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

#[cfg(unix)]
pub mod call;
pub mod normalize;
pub mod probe;
#[cfg(unix)]
pub mod serve;
pub mod strip;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read and print video metadata from a file.
    Probe(ProbeArgs),
    /// Copy a video with its metadata carriers blanked.
    Strip(TransformArgs),
    /// Copy a video with its display rotation baked out.
    Normalize(TransformArgs),
    /// Serve media operations on a unix socket until ctrl-c.
    #[cfg(unix)]
    Serve(ServeArgs),
    /// Connect to a worker socket and issue one raw call.
    #[cfg(unix)]
    Call(CallArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub async fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Probe(args) => probe::run(args, format).await,
        Command::Strip(args) => strip::run(args, format).await,
        Command::Normalize(args) => normalize::run(args, format).await,
        #[cfg(unix)]
        Command::Serve(args) => serve::run(args, format).await,
        #[cfg(unix)]
        Command::Call(args) => call::run(args, format).await,
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Video file to inspect.
    pub file: PathBuf,
    /// Maximum time to wait for the worker reply (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct TransformArgs {
    /// Source video file.
    pub src: PathBuf,
    /// Destination path for the rewritten copy.
    pub dst: PathBuf,
}

#[cfg(unix)]
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Socket path to bind.
    #[arg(long, value_name = "PATH")]
    pub socket: PathBuf,
    /// Directory holding the media stores.
    #[arg(long, value_name = "DIR")]
    pub store_root: PathBuf,
}

#[cfg(unix)]
#[derive(Args, Debug)]
pub struct CallArgs {
    /// Socket path to connect to.
    #[arg(long, value_name = "PATH")]
    pub socket: PathBuf,
    /// Method name to invoke.
    pub method: String,
    /// Arguments as a JSON array.
    #[arg(value_name = "ARGS_JSON")]
    pub args: Option<String>,
    /// Maximum time to wait for the reply (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn parse_timeout(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "timeout must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid timeout value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "timeout must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported timeout unit: {unit}"),
        )),
    }
}
