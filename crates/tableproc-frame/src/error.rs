/// Errors that can occur during framing and payload decoding.
///
/// Everything except `Io` and `ConnectionClosed` means the two ends no
/// longer agree on message shape; the wire format has no way to resync.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The header length field is smaller than the header itself.
    #[error("invalid frame length {len} (header is {header} bytes)")]
    InvalidLength { len: usize, header: usize },

    /// The frame exceeds the configured maximum size.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// A field read asked for more bytes than the payload has left.
    #[error("bad msg len: wanted {wanted} bytes, {remaining} remaining")]
    ShortPayload { wanted: usize, remaining: usize },

    /// Bytes were left over after the payload was fully decoded.
    #[error("bogus data: {remaining} trailing bytes in payload")]
    TrailingData { remaining: usize },

    /// The pending reply would not fit in its buffer.
    #[error("reply too large ({size} bytes, max {max})")]
    ReplyOverflow { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The channel was closed before a complete frame was received.
    #[error("connection closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
