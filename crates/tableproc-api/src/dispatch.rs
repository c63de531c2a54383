use std::ffi::CStr;
use std::io::Write;

use tableproc_frame::{Frame, FrameWriter, PayloadCursor, ReplyBuilder};
use tracing::{debug, warn};

use crate::error::SessionFault;
use crate::key::Key;
use crate::opcode::{Opcode, PROC_TABLE_API_VERSION, PROC_TABLE_OK};
use crate::outcome::Outcome;
use crate::registry::HandlerRegistry;
use crate::service::KeyKind;
use crate::value::ValueBuffer;

/// What the session loop should do after a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// A reply was queued; flush it and read the next frame.
    Continue,
    /// CLOSE was received; stop without replying.
    Terminate,
}

type Result<T> = std::result::Result<T, SessionFault>;

/// Decodes one request frame, runs its handler and queues the reply.
///
/// Payload shape is validated before any handler runs. Every opcode but
/// CLOSE queues exactly one reply frame on the writer; nothing is flushed
/// here.
#[derive(Debug)]
pub struct Dispatcher {
    handlers: HandlerRegistry,
    api_version: u32,
    reply: ReplyBuilder,
    value: ValueBuffer,
}

impl Dispatcher {
    pub fn new(handlers: HandlerRegistry) -> Self {
        Self::with_version(handlers, PROC_TABLE_API_VERSION)
    }

    /// A dispatcher that accepts OPEN only for `api_version`.
    pub fn with_version(handlers: HandlerRegistry, api_version: u32) -> Self {
        Self {
            handlers,
            api_version,
            reply: ReplyBuilder::new(PROC_TABLE_OK),
            value: ValueBuffer::new(),
        }
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    pub fn dispatch<W: Write>(&mut self, frame: &Frame, out: &mut FrameWriter<W>) -> Result<Flow> {
        let opcode = Opcode::try_from(frame.kind).map_err(SessionFault::BadMessage)?;
        let mut cursor = PayloadCursor::new(&frame.payload);
        debug!(%opcode, len = frame.payload.len(), "dispatching request");

        match opcode {
            Opcode::Open => {
                let version = cursor.take_u32()?;
                cursor.finish()?;
                if version != self.api_version {
                    return Err(SessionFault::VersionMismatch {
                        expected: self.api_version,
                        got: version,
                    });
                }
                self.reply.send(out)?;
            }

            Opcode::Update => {
                cursor.finish()?;
                let outcome = self.handlers.update();
                self.send_result(outcome, out)?;
            }

            Opcode::Close => {
                cursor.finish()?;
                return Ok(Flow::Terminate);
            }

            Opcode::Check => {
                let kind = cursor.take_i32()?;
                let key = take_key(&mut cursor, opcode)?;
                cursor.finish()?;
                let outcome = self.handlers.check(kind, key);
                debug!(kind = KeyKind::describe(kind), %key, ?outcome, "check");
                self.send_result(outcome, out)?;
            }

            Opcode::Lookup => {
                let kind = cursor.take_i32()?;
                let key = take_key(&mut cursor, opcode)?;
                cursor.finish()?;
                self.value.clear();
                let outcome = self.handlers.lookup(kind, key, &mut self.value);
                debug!(kind = KeyKind::describe(kind), %key, ?outcome, "lookup");
                self.send_value(outcome, out)?;
            }

            Opcode::Fetch => {
                let kind = cursor.take_i32()?;
                cursor.finish()?;
                self.value.clear();
                let outcome = self.handlers.fetch(kind, &mut self.value);
                debug!(kind = KeyKind::describe(kind), ?outcome, "fetch");
                self.send_value(outcome, out)?;
            }
        }

        Ok(Flow::Continue)
    }

    fn send_result<W: Write>(&mut self, outcome: Outcome, out: &mut FrameWriter<W>) -> Result<()> {
        self.reply.append_i32(outcome.code())?;
        self.reply.send(out)?;
        Ok(())
    }

    fn send_value<W: Write>(&mut self, outcome: Outcome, out: &mut FrameWriter<W>) -> Result<()> {
        self.reply.append_i32(outcome.code())?;
        if outcome.is_found() {
            self.reply.append(self.value.as_bytes())?;
            self.reply.append(&[0])?;
        }
        self.reply.send(out)?;
        Ok(())
    }
}

/// Take the NUL-terminated key that fills the rest of the payload.
///
/// The key handed to the handler stops at the first NUL. Its bytes are
/// passed on unchanged.
fn take_key<'a>(cursor: &mut PayloadCursor<'a>, opcode: Opcode) -> Result<Key<'a>> {
    let rest = cursor.peek_rest();
    match rest.last() {
        None => return Err(SessionFault::MissingKey { opcode }),
        Some(0) => {}
        Some(_) => return Err(SessionFault::UnterminatedKey { opcode }),
    }

    let raw = cursor.take_rest();
    let key = CStr::from_bytes_until_nul(raw).map_err(|_| SessionFault::UnterminatedKey { opcode })?;
    if key.count_bytes() + 1 != raw.len() {
        warn!(%opcode, "key has bytes after its first NUL; ignoring them");
    }
    Ok(Key::new(key))
}
