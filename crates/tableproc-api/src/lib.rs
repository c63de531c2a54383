//! The table backend protocol.
//!
//! A parent process opens a session over a byte-stream channel and asks
//! the backend to check keys, look them up, fetch entries or reload. The
//! backend registers up to four handlers in a [`HandlerRegistry`] and
//! hands them to a [`Session`], which reads one frame at a time, runs the
//! [`Dispatcher`] and flushes the reply before reading again.
//!
//! Any malformed frame is a [`SessionFault`]: the wire format cannot be
//! resynchronized, so the session stops and the caller decides what to do
//! with the process. Operational misses travel back to the parent as
//! ordinary [`Outcome`] codes.
//!
//! [`TableClient`] is the parent side of the same protocol.

pub mod client;
pub mod dispatch;
pub mod error;
pub mod key;
pub mod opcode;
pub mod outcome;
pub mod registry;
pub mod service;
pub mod session;
pub mod value;

pub use client::{Answer, TableClient};
pub use dispatch::{Dispatcher, Flow};
pub use error::{ClientError, SessionFault};
pub use key::Key;
pub use opcode::{Opcode, PROC_TABLE_API_VERSION, PROC_TABLE_FAIL, PROC_TABLE_OK};
pub use outcome::Outcome;
pub use registry::{Capabilities, HandlerRegistry};
pub use service::KeyKind;
pub use session::{Session, SessionConfig, SessionEnd};
pub use value::{ValueBuffer, ValueError, VALUE_CAPACITY};
