//! Byte-stream channel between a parent process and a table backend.
//!
//! The parent normally hands the backend one end of a socket pair as an
//! inherited file descriptor. For development and testing the same
//! [`ChannelStream`] can also come from a Unix domain socket or an
//! in-process pair.
//!
//! Unix only. This is the lowest layer of tableproc. The framing layer
//! reads and writes through [`ChannelStream`] and never touches
//! descriptors itself.

#[cfg(not(unix))]
compile_error!("tableproc-transport needs Unix domain sockets and inherited descriptors");

pub mod error;
pub mod stream;
pub mod uds;

pub use error::{Result, TransportError};
pub use stream::ChannelStream;
pub use uds::SocketListener;
