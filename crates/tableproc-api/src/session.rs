use std::io::{ErrorKind, Read, Write};

use tableproc_frame::{FrameConfig, FrameError, FrameReader, FrameWriter};
use tableproc_transport::ChannelStream;
use tracing::{debug, info, warn};

use crate::dispatch::{Dispatcher, Flow};
use crate::error::SessionFault;
use crate::opcode::PROC_TABLE_API_VERSION;
use crate::registry::HandlerRegistry;

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Frame size limit and channel timeouts.
    pub frame: FrameConfig,
    /// Protocol version required in OPEN.
    pub api_version: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig::default(),
            api_version: PROC_TABLE_API_VERSION,
        }
    }
}

/// How a session ended without a protocol fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The parent sent CLOSE.
    Closed,
    /// The channel reached end-of-stream.
    PeerClosed,
    /// Reading from the channel failed.
    ReadFailed(ErrorKind),
}

/// Serves requests from one channel until it closes.
pub struct Session<R, W> {
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
    dispatcher: Dispatcher,
    served: u64,
}

impl Session<ChannelStream, ChannelStream> {
    /// Serve `handlers` over `channel`, which the session takes ownership of.
    pub fn over_channel(
        channel: ChannelStream,
        handlers: HandlerRegistry,
        config: SessionConfig,
    ) -> Result<Self, SessionFault> {
        let read_half = channel.try_clone().map_err(transport_fault)?;
        let reader = FrameReader::for_channel(read_half, config.frame.clone())?;
        let writer = FrameWriter::for_channel(channel, config.frame)?;
        Ok(Self {
            reader,
            writer,
            dispatcher: Dispatcher::with_version(handlers, config.api_version),
            served: 0,
        })
    }
}

impl<R: Read, W: Write> Session<R, W> {
    /// Build a session from separate read and write halves.
    pub fn new(reader: R, writer: W, handlers: HandlerRegistry, config: SessionConfig) -> Self {
        Self {
            reader: FrameReader::with_config(reader, config.frame.clone()),
            writer: FrameWriter::with_config(writer, config.frame),
            dispatcher: Dispatcher::with_version(handlers, config.api_version),
            served: 0,
        }
    }

    /// Requests dispatched so far.
    pub fn served(&self) -> u64 {
        self.served
    }

    /// Run until CLOSE, end-of-stream, a read error or a fault.
    ///
    /// Faults are returned as `Err` and are never answered on the wire.
    pub fn run(&mut self) -> Result<SessionEnd, SessionFault> {
        info!(
            capabilities = ?self.dispatcher.handlers().capabilities(),
            "table session started"
        );

        let result = self.serve();
        match &result {
            Ok(end) => info!(?end, served = self.served, "table session ended"),
            Err(fault) => warn!(error = %fault, served = self.served, "table session aborted"),
        }
        result
    }

    fn serve(&mut self) -> Result<SessionEnd, SessionFault> {
        loop {
            let frame = match self.reader.read_frame() {
                Ok(frame) => frame,
                Err(FrameError::ConnectionClosed) => {
                    warn!(buffered = self.reader.buffered(), "pipe closed");
                    return Ok(SessionEnd::PeerClosed);
                }
                Err(FrameError::Io(err)) => {
                    warn!(error = %err, "channel read failed");
                    return Ok(SessionEnd::ReadFailed(err.kind()));
                }
                Err(other) => return Err(other.into()),
            };

            let flow = self.dispatcher.dispatch(&frame, &mut self.writer)?;
            self.served += 1;
            if flow == Flow::Terminate {
                debug!("close requested");
                return Ok(SessionEnd::Closed);
            }

            self.writer.flush()?;
        }
    }

    /// Consume the session and return its read and write halves.
    pub fn into_inner(self) -> (R, W) {
        (self.reader.into_inner(), self.writer.into_inner())
    }
}

fn transport_fault(err: tableproc_transport::TransportError) -> SessionFault {
    let io = match err {
        tableproc_transport::TransportError::Io(io) => io,
        other => std::io::Error::other(other.to_string()),
    };
    SessionFault::Frame(FrameError::Io(io))
}
