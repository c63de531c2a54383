use tableproc_frame::FrameError;

use crate::opcode::Opcode;

/// An unrecoverable protocol fault.
///
/// Raised for any frame whose shape does not match its opcode, and for
/// write failures on the channel. The session ends immediately; the
/// owning process decides whether that means exiting.
#[derive(Debug, thiserror::Error)]
pub enum SessionFault {
    /// Framing, payload shape or channel write error.
    #[error("framing fault: {0}")]
    Frame(#[from] FrameError),

    /// The parent speaks a different protocol version.
    #[error("bad API version {got} (expected {expected})")]
    VersionMismatch { expected: u32, got: u32 },

    /// The message type is not one of the request opcodes.
    #[error("bad message {0}")]
    BadMessage(u32),

    /// A keyed request carried nothing after its type tag.
    #[error("{opcode}: no key")]
    MissingKey { opcode: Opcode },

    /// A keyed request whose key does not end in NUL.
    #[error("{opcode}: key not NUL-terminated")]
    UnterminatedKey { opcode: Opcode },
}

/// Errors seen by the parent side of a session.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Framing or I/O error on the channel.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Failed to obtain or configure the channel.
    #[error("transport error: {0}")]
    Transport(#[from] tableproc_transport::TransportError),

    /// Keys travel NUL-terminated and cannot contain NUL themselves.
    #[error("key contains an interior NUL byte")]
    InvalidKey,

    /// The backend answered with something other than `PROC_TABLE_OK`.
    #[error("unexpected reply type {0}")]
    UnexpectedReply(u32),

    /// The result field held a value outside the tri-state.
    #[error("invalid result code {0}")]
    InvalidResult(i32),

    /// A positive LOOKUP/FETCH reply whose value is missing its terminator.
    #[error("reply value not NUL-terminated")]
    UnterminatedValue,
}
