use std::os::fd::RawFd;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use tableproc_api::KeyKind;
use tableproc_transport::stream::DEFAULT_CHANNEL_FD;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod query;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve a key/value file as a table backend.
    Serve(ServeArgs),
    /// Run one request against a backend listening on a socket.
    Query(QueryArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args),
        Command::Query(args) => query::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Table file: `key value` or bare `key` per line, `#` comments.
    pub table: PathBuf,
    /// Inherited descriptor carrying the channel.
    #[arg(long, default_value_t = DEFAULT_CHANNEL_FD, conflicts_with = "socket")]
    pub fd: RawFd,
    /// Listen on a Unix socket instead and serve connections one at a time.
    #[arg(long, value_name = "PATH")]
    pub socket: Option<PathBuf>,
    /// With --socket, exit after the first session.
    #[arg(long, requires = "socket")]
    pub once: bool,
    /// Abort a session whose reply cannot be written within this time (e.g. 5s, 500ms).
    #[arg(long, value_name = "DURATION")]
    pub write_timeout: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Operation {
    Update,
    Check,
    Lookup,
    Fetch,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::Update => "update",
            Operation::Check => "check",
            Operation::Lookup => "lookup",
            Operation::Fetch => "fetch",
        }
    }

    pub fn takes_key(self) -> bool {
        matches!(self, Operation::Check | Operation::Lookup)
    }
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Request to send.
    #[arg(value_enum)]
    pub op: Operation,
    /// Key for check and lookup.
    pub key: Option<String>,
    /// Socket path of the backend.
    #[arg(long, env = "TABLEPROC_SOCKET", value_name = "PATH")]
    pub socket: PathBuf,
    /// Key type, by name (e.g. mailaddr) or numeric tag.
    #[arg(long, default_value = "none", value_parser = parse_kind)]
    pub kind: i32,
    /// Maximum time to wait for each reply (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_kind(input: &str) -> Result<i32, String> {
    if let Ok(tag) = input.parse::<i32>() {
        return Ok(tag);
    }
    input.parse::<KeyKind>().map(KeyKind::tag)
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = match input.strip_suffix("ms") {
        Some(num) => (num, true),
        None => (input.strip_suffix('s').unwrap_or(input), false),
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
