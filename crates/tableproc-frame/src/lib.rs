//! Message framing for the table protocol.
//!
//! Every message travels with a 16-byte imsg header in native byte order:
//! - 4-byte message type (the opcode)
//! - 2-byte total length, header included
//! - 2-byte flags (unused, always zero on send)
//! - 4-byte peer id and 4-byte pid (zero on send)
//!
//! On top of whole frames this crate provides the [`PayloadCursor`] used to
//! pull fixed-shape fields out of one payload, and the [`ReplyBuilder`]
//! that accumulates one reply before it is queued as a single frame.

pub mod codec;
pub mod cursor;
pub mod error;
pub mod reader;
pub mod reply;
pub mod writer;

pub use codec::{decode_frame, encode_frame, Frame, FrameConfig, HEADER_SIZE, MAX_FRAME_SIZE};
pub use cursor::PayloadCursor;
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use reply::{ReplyBuilder, REPLY_CAPACITY};
pub use writer::FrameWriter;
