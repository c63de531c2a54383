use std::io::{Read, Write};
use std::os::fd::{AsRawFd, FromRawFd, RawFd};
use std::os::unix::net::UnixStream;

use tracing::debug;

use crate::error::{Result, TransportError};

/// The descriptor a table backend inherits its channel on.
pub const DEFAULT_CHANNEL_FD: RawFd = 0;

/// A connected, bidirectional channel to the parent process.
///
/// Owns its descriptor: dropping the stream closes the channel.
pub struct ChannelStream {
    inner: UnixStream,
    origin: Origin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Inherited(RawFd),
    Socket,
    Pair,
}

impl ChannelStream {
    /// Adopt a descriptor inherited from the parent process.
    ///
    /// The descriptor is checked with `fcntl(F_GETFD)` first so that a
    /// missing channel is reported as [`TransportError::BadDescriptor`]
    /// instead of surfacing as `EBADF` on the first read. On success the
    /// stream takes ownership and closes `fd` on drop; callers must not
    /// adopt the same descriptor twice.
    pub fn from_inherited_fd(fd: RawFd) -> Result<Self> {
        // SAFETY: F_GETFD only queries descriptor flags and has no side effects.
        let rc = unsafe { libc::fcntl(fd, libc::F_GETFD) };
        if rc == -1 {
            return Err(TransportError::BadDescriptor {
                fd,
                source: std::io::Error::last_os_error(),
            });
        }

        // SAFETY: `fd` is open (checked above) and ownership moves into the
        // stream; the doc contract forbids adopting it more than once.
        let inner = unsafe { UnixStream::from_raw_fd(fd) };
        debug!(fd, "adopted inherited channel descriptor");
        Ok(Self {
            inner,
            origin: Origin::Inherited(fd),
        })
    }

    /// Create a connected in-process pair, e.g. parent and backend ends.
    pub fn pair() -> Result<(Self, Self)> {
        let (left, right) = UnixStream::pair()?;
        Ok((Self::from_unix(left, Origin::Pair), Self::from_unix(right, Origin::Pair)))
    }

    pub(crate) fn from_socket(stream: UnixStream) -> Self {
        Self::from_unix(stream, Origin::Socket)
    }

    fn from_unix(inner: UnixStream, origin: Origin) -> Self {
        Self { inner, origin }
    }

    /// Duplicate the descriptor so reading and writing can be owned separately.
    pub fn try_clone(&self) -> Result<Self> {
        let inner = self.inner.try_clone()?;
        Ok(Self {
            inner,
            origin: self.origin,
        })
    }

    /// Set read timeout on the underlying socket.
    pub fn set_read_timeout(&self, timeout: Option<std::time::Duration>) -> Result<()> {
        self.inner.set_read_timeout(timeout).map_err(Into::into)
    }

    /// Set write timeout on the underlying socket.
    pub fn set_write_timeout(&self, timeout: Option<std::time::Duration>) -> Result<()> {
        self.inner.set_write_timeout(timeout).map_err(Into::into)
    }

    /// Shut down both directions; the peer observes end-of-stream.
    pub fn shutdown(&self) -> Result<()> {
        self.inner
            .shutdown(std::net::Shutdown::Both)
            .map_err(Into::into)
    }

    /// Short label for diagnostics.
    pub fn describe(&self) -> String {
        match self.origin {
            Origin::Inherited(fd) => format!("fd:{fd}"),
            Origin::Socket => "unix-socket".to_string(),
            Origin::Pair => "socket-pair".to_string(),
        }
    }
}

impl Read for ChannelStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for ChannelStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl AsRawFd for ChannelStream {
    fn as_raw_fd(&self) -> RawFd {
        self.inner.as_raw_fd()
    }
}

impl std::fmt::Debug for ChannelStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelStream")
            .field("origin", &self.describe())
            .field("fd", &self.inner.as_raw_fd())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_is_bidirectional() {
        let (mut parent, mut backend) = ChannelStream::pair().unwrap();

        parent.write_all(b"ping").unwrap();
        let mut buf = [0u8; 4];
        backend.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ping");

        backend.write_all(b"pong").unwrap();
        parent.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"pong");
    }

    #[test]
    fn shutdown_yields_eof_on_peer() {
        let (parent, mut backend) = ChannelStream::pair().unwrap();
        parent.shutdown().unwrap();

        let mut buf = [0u8; 8];
        assert_eq!(backend.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn clone_shares_the_channel() {
        let (mut parent, backend) = ChannelStream::pair().unwrap();
        let mut reader = backend.try_clone().unwrap();

        parent.write_all(b"x").unwrap();
        let mut buf = [0u8; 1];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"x");
        assert_eq!(reader.describe(), "socket-pair");
    }

    #[test]
    fn rejects_closed_descriptor() {
        let err = ChannelStream::from_inherited_fd(-1).unwrap_err();
        assert!(matches!(err, TransportError::BadDescriptor { fd: -1, .. }));
    }

    #[test]
    fn adopts_open_descriptor() {
        use std::os::fd::IntoRawFd;

        let (left, right) = UnixStream::pair().unwrap();
        let fd = right.into_raw_fd();
        let mut adopted = ChannelStream::from_inherited_fd(fd).unwrap();
        assert_eq!(adopted.describe(), format!("fd:{fd}"));

        let mut left = left;
        left.write_all(b"ok").unwrap();
        let mut buf = [0u8; 2];
        adopted.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ok");
    }
}
