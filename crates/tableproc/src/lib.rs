//! Table backend protocol for privilege-separated mail daemons.
//!
//! A mail daemon keeps its tables (aliases, credentials, relay lists) in
//! separate backend processes and talks to each one over an inherited
//! socket. This crate bundles the pieces a backend needs.
//!
//! # Crate Structure
//!
//! - [`transport`]: the channel (inherited fd, socket pair, Unix socket)
//! - [`frame`]: imsg-compatible framing over the channel
//! - [`api`]: dispatcher, handler registry, session loop and client

/// Re-export transport types.
pub mod transport {
    pub use tableproc_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use tableproc_frame::*;
}

/// Re-export protocol types.
pub mod api {
    pub use tableproc_api::*;
}
