use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use tableproc_api::{Session, SessionConfig, SessionEnd};
use tableproc_transport::{ChannelStream, SocketListener};
use tracing::{info, warn};

use crate::cmd::{parse_duration, ServeArgs};
use crate::exit::{io_error, session_fault, transport_error, CliResult, SUCCESS};
use crate::table::{self, StaticTable};

pub fn run(args: ServeArgs) -> CliResult<i32> {
    let table = StaticTable::load(&args.table)
        .map_err(|err| io_error(&format!("failed reading {}", args.table.display()), err))?;
    if table.is_empty() {
        warn!(path = %args.table.display(), "table file has no entries");
    }
    info!(path = %args.table.display(), entries = table.len(), "table loaded");
    let table = Rc::new(RefCell::new(table));

    let mut config = SessionConfig::default();
    if let Some(timeout) = &args.write_timeout {
        config.frame.write_timeout = Some(parse_duration(timeout)?);
    }

    match &args.socket {
        Some(path) => serve_socket(path, &table, &config, args.once),
        None => {
            let channel = ChannelStream::from_inherited_fd(args.fd)
                .map_err(|err| transport_error("channel unavailable", err))?;
            serve_channel(channel, &table, &config)?;
            Ok(SUCCESS)
        }
    }
}

fn serve_socket(
    path: &Path,
    table: &Rc<RefCell<StaticTable>>,
    config: &SessionConfig,
    once: bool,
) -> CliResult<i32> {
    let listener =
        SocketListener::bind(path).map_err(|err| transport_error("bind failed", err))?;

    loop {
        let channel = listener
            .accept()
            .map_err(|err| transport_error("accept failed", err))?;
        serve_channel(channel, table, config)?;
        if once {
            return Ok(SUCCESS);
        }
    }
}

/// Run one session. Any fault ends the process with a non-zero code.
fn serve_channel(
    channel: ChannelStream,
    table: &Rc<RefCell<StaticTable>>,
    config: &SessionConfig,
) -> CliResult<SessionEnd> {
    info!(channel = %channel.describe(), "session accepted");
    let handlers = table::registry(Rc::clone(table));
    let mut session = Session::over_channel(channel, handlers, config.clone())
        .map_err(|fault| session_fault("session setup failed", fault))?;
    session
        .run()
        .map_err(|fault| session_fault("table session aborted", fault))
}
