use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use tableproc_transport::ChannelStream;
use tracing::debug;

use crate::codec::{encode_frame, Frame, FrameConfig, MAX_FRAME_SIZE};
use crate::error::{FrameError, Result};
use crate::reader::transport_to_frame_error;

/// Writes complete frames to any `Write` stream.
///
/// Frames are queued into an outbox with [`queue`](Self::queue) and written
/// out by [`flush`](Self::flush). A frame is encoded in full before it
/// enters the outbox, so a failed encode never leaves half a frame queued.
pub struct FrameWriter<T> {
    inner: T,
    outbox: BytesMut,
    queued: usize,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            outbox: BytesMut::with_capacity(MAX_FRAME_SIZE),
            queued: 0,
            config,
        }
    }

    /// Encode a frame into the outbox without writing it.
    pub fn queue(&mut self, frame: &Frame) -> Result<()> {
        encode_frame(frame, self.config.max_frame_size, &mut self.outbox)?;
        self.queued += 1;
        Ok(())
    }

    /// Queue a frame and flush immediately.
    pub fn send(&mut self, frame: &Frame) -> Result<()> {
        self.queue(frame)?;
        self.flush()
    }

    /// Number of frames waiting in the outbox.
    pub fn pending(&self) -> usize {
        self.queued
    }

    /// Write every queued frame and flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        let mut offset = 0usize;
        while offset < self.outbox.len() {
            match self.inner.write(&self.outbox[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        self.outbox.clear();
        self.queued = 0;

        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner stream. Unflushed frames are dropped.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameWriter<ChannelStream> {
    /// Create a frame writer for a channel and apply the write timeout from config.
    ///
    /// Without a timeout the descriptor is left untouched.
    pub fn for_channel(inner: ChannelStream, config: FrameConfig) -> Result<Self> {
        if let Some(timeout) = config.write_timeout {
            inner
                .set_write_timeout(Some(timeout))
                .map_err(transport_to_frame_error)?;
            debug!(channel = %inner.describe(), ?timeout, "write timeout set");
        }
        Ok(Self::with_config(inner, config))
    }
}
