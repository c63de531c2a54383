use tableproc_api::{Outcome, TableClient};
use tableproc_frame::FrameConfig;
use tableproc_transport::SocketListener;
use tracing::debug;

use crate::cmd::{parse_duration, Operation, QueryArgs};
use crate::exit::{client_error, transport_error, CliError, CliResult, FAILURE, SUCCESS, USAGE};
use crate::output::{print_report, OutputFormat, QueryReport};

pub fn run(args: QueryArgs, format: OutputFormat) -> CliResult<i32> {
    let key = validate_key(args.op, args.key)?;
    let timeout = parse_duration(&args.timeout)?;

    let channel = SocketListener::connect(&args.socket)
        .map_err(|err| transport_error("connect failed", err))?;
    let config = FrameConfig {
        read_timeout: Some(timeout),
        write_timeout: Some(timeout),
        ..FrameConfig::default()
    };
    let mut client = TableClient::over_channel(channel, config)
        .map_err(|err| client_error("channel setup failed", err))?;
    client.open().map_err(|err| client_error("open failed", err))?;

    let op = args.op.name();
    let context = format!("{op} failed");
    let report = match (args.op, key) {
        (Operation::Update, _) => {
            let outcome = client.update().map_err(|err| client_error(&context, err))?;
            QueryReport::new(op, args.kind, None, outcome)
        }
        (Operation::Check, Some(key)) => {
            let outcome = client
                .check(args.kind, &key)
                .map_err(|err| client_error(&context, err))?;
            QueryReport::new(op, args.kind, Some(key), outcome)
        }
        (Operation::Lookup, Some(key)) => {
            let answer = client
                .lookup(args.kind, &key)
                .map_err(|err| client_error(&context, err))?;
            QueryReport::new(op, args.kind, Some(key), answer.outcome).with_value(answer.value)
        }
        (Operation::Fetch, _) => {
            let answer = client
                .fetch(args.kind)
                .map_err(|err| client_error(&context, err))?;
            QueryReport::new(op, args.kind, None, answer.outcome).with_value(answer.value)
        }
        (_, None) => return Err(CliError::new(USAGE, format!("{op} needs a key"))),
    };

    client.close().map_err(|err| client_error("close failed", err))?;
    debug!(op, result = ?report.result, "query complete");
    print_report(&report, format);

    Ok(match report.result {
        Outcome::Failed => FAILURE,
        Outcome::Found | Outcome::NotFound => SUCCESS,
    })
}

fn validate_key(op: Operation, key: Option<String>) -> CliResult<Option<String>> {
    match (op.takes_key(), key) {
        (true, None) => Err(CliError::new(USAGE, format!("{} needs a key", op.name()))),
        (false, Some(_)) => Err(CliError::new(
            USAGE,
            format!("{} does not take a key", op.name()),
        )),
        (_, key) => Ok(key),
    }
}
