use std::io::Write;

use bytes::{BufMut, BytesMut};

use crate::codec::{Frame, HEADER_SIZE, MAX_FRAME_SIZE};
use crate::error::{FrameError, Result};
use crate::writer::FrameWriter;

/// Payload capacity of one reply: whatever fits in a maximum-size frame.
pub const REPLY_CAPACITY: usize = MAX_FRAME_SIZE - HEADER_SIZE;

/// Accumulates one outgoing reply field by field.
///
/// The buffer is allocated on the first append. [`send`](Self::send) hands
/// the whole payload to the writer's queue as one frame and leaves the
/// builder empty for the next request.
#[derive(Debug)]
pub struct ReplyBuilder {
    kind: u32,
    pending: Option<BytesMut>,
    capacity: usize,
}

impl ReplyBuilder {
    /// Builder for replies of message type `kind`.
    pub fn new(kind: u32) -> Self {
        Self::with_capacity(kind, REPLY_CAPACITY)
    }

    pub fn with_capacity(kind: u32, capacity: usize) -> Self {
        Self {
            kind,
            pending: None,
            capacity,
        }
    }

    /// Append raw bytes to the pending reply.
    pub fn append(&mut self, data: &[u8]) -> Result<()> {
        let capacity = self.capacity;
        let buf = self
            .pending
            .get_or_insert_with(|| BytesMut::with_capacity(capacity.min(1024)));

        let size = buf.len() + data.len();
        if size > capacity {
            return Err(FrameError::ReplyOverflow {
                size,
                max: capacity,
            });
        }
        buf.put_slice(data);
        Ok(())
    }

    /// Append a native-endian `i32`.
    pub fn append_i32(&mut self, value: i32) -> Result<()> {
        self.append(&value.to_ne_bytes())
    }

    /// Bytes accumulated so far.
    pub fn len(&self) -> usize {
        self.pending.as_ref().map_or(0, BytesMut::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Queue the pending reply on `writer` and clear it.
    ///
    /// A builder with nothing appended queues an empty-payload frame.
    /// Nothing is written to the stream until the writer is flushed.
    pub fn send<W: Write>(&mut self, writer: &mut FrameWriter<W>) -> Result<()> {
        let payload = self.pending.take().unwrap_or_default().freeze();
        writer.queue(&Frame::new(self.kind, payload))
    }
}
