use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use tableproc_transport::ChannelStream;
use tracing::{debug, warn};

use crate::codec::{decode_frame, Frame, FrameConfig, MAX_FRAME_SIZE};
use crate::error::{FrameError, Result};

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete frames from any `Read` stream.
///
/// Bytes are buffered across reads until a whole frame is present, so
/// callers always get complete frames.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(MAX_FRAME_SIZE),
            config,
        }
    }

    /// Decode the next frame from bytes already buffered, without reading.
    pub fn try_next(&mut self) -> Result<Option<Frame>> {
        decode_frame(&mut self.buf, self.config.max_frame_size).inspect_err(|err| {
            warn!(error = %err, buffered = self.buf.len(), "undecodable frame header");
        })
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = self.try_next()? {
                return Ok(frame);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                if !self.buf.is_empty() {
                    debug!(buffered = self.buf.len(), "end of stream inside a frame");
                }
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Bytes received but not yet decoded into a frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameReader<ChannelStream> {
    /// Create a frame reader for a channel and apply the read timeout from config.
    ///
    /// Without a timeout the descriptor is left untouched, so an inherited
    /// pipe works as well as a socket.
    pub fn for_channel(inner: ChannelStream, config: FrameConfig) -> Result<Self> {
        if let Some(timeout) = config.read_timeout {
            inner
                .set_read_timeout(Some(timeout))
                .map_err(transport_to_frame_error)?;
            debug!(channel = %inner.describe(), ?timeout, "read timeout set");
        }
        Ok(Self::with_config(inner, config))
    }
}

pub(crate) fn transport_to_frame_error(err: tableproc_transport::TransportError) -> FrameError {
    match err {
        tableproc_transport::TransportError::Io(io)
        | tableproc_transport::TransportError::Accept(io) => FrameError::Io(io),
        tableproc_transport::TransportError::Bind { source, .. }
        | tableproc_transport::TransportError::Connect { source, .. }
        | tableproc_transport::TransportError::BadDescriptor { source, .. } => {
            FrameError::Io(source)
        }
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::{BufMut, Bytes};

    use super::*;
    use crate::codec::{encode_frame, HEADER_SIZE};

    fn wire(frames: &[Frame]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for frame in frames {
            encode_frame(frame, MAX_FRAME_SIZE, &mut buf).unwrap();
        }
        buf.to_vec()
    }

    #[test]
    fn read_multiple_frames() {
        let bytes = wire(&[
            Frame::new(2, 1u32.to_ne_bytes().to_vec()),
            Frame::new(5, &b"\x01\0\0\0key\0"[..]),
            Frame::new(3, Bytes::new()),
        ]);
        let mut reader = FrameReader::new(Cursor::new(bytes));

        assert_eq!(reader.read_frame().unwrap().kind, 2);
        let check = reader.read_frame().unwrap();
        assert_eq!(check.kind, 5);
        assert_eq!(&check.payload[4..], b"key\0");
        assert_eq!(reader.read_frame().unwrap().kind, 3);
        assert!(matches!(
            reader.read_frame().unwrap_err(),
            FrameError::ConnectionClosed
        ));
    }

    #[test]
    fn partial_read_handling() {
        let bytes = wire(&[Frame::new(6, &b"\0\0\0\0slow\0"[..])]);
        let mut reader = FrameReader::new(ByteByByteReader { bytes, pos: 0 });

        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.kind, 6);
        assert_eq!(&frame.payload[4..], b"slow\0");
    }

    #[test]
    fn try_next_does_not_read() {
        let mut reader = FrameReader::new(Cursor::new(wire(&[Frame::new(4, Bytes::new())])));
        assert!(reader.try_next().unwrap().is_none());
        assert_eq!(reader.buffered(), 0);

        reader.read_frame().unwrap();
        assert!(reader.try_next().unwrap().is_none());
    }

    #[test]
    fn connection_closed_mid_frame() {
        let mut partial = BytesMut::new();
        partial.put_slice(&5u32.to_ne_bytes());
        partial.put_slice(&((HEADER_SIZE + 16) as u16).to_ne_bytes());
        partial.put_slice(&[0u8; 10]);
        partial.put_slice(b"only-part");

        let mut reader = FrameReader::new(Cursor::new(partial.to_vec()));
        assert!(matches!(
            reader.read_frame().unwrap_err(),
            FrameError::ConnectionClosed
        ));
        assert_eq!(reader.buffered(), HEADER_SIZE + 9);
    }

    #[test]
    fn oversized_frame_in_stream() {
        let mut bytes = BytesMut::new();
        bytes.put_slice(&6u32.to_ne_bytes());
        bytes.put_slice(&1024u16.to_ne_bytes());
        bytes.put_slice(&[0u8; 10]);

        let cfg = FrameConfig {
            max_frame_size: 64,
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config(Cursor::new(bytes.to_vec()), cfg);
        assert!(matches!(
            reader.read_frame().unwrap_err(),
            FrameError::FrameTooLarge { size: 1024, max: 64 }
        ));
    }

    #[test]
    fn interrupted_read_retries() {
        let bytes = wire(&[Frame::new(4, Bytes::new())]);
        let mut reader = FrameReader::new(InterruptedThenData {
            interrupted: false,
            inner: Cursor::new(bytes),
        });
        assert_eq!(reader.read_frame().unwrap().kind, 4);
    }

    #[test]
    fn read_error_propagates() {
        let mut reader = FrameReader::new(FailingReader);
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }

    #[test]
    fn roundtrip_over_channel_pair() {
        let (parent, backend) = ChannelStream::pair().unwrap();
        let mut writer = crate::writer::FrameWriter::new(parent);
        let mut reader = FrameReader::for_channel(backend, FrameConfig::default()).unwrap();

        writer.send(&Frame::new(2, 1u32.to_ne_bytes().to_vec())).unwrap();
        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.kind, 2);
        assert_eq!(frame.payload.as_ref(), &1u32.to_ne_bytes());
    }

    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }
    }

    #[cfg(unix)]
    fn inherited_pipe() -> ChannelStream {
        use std::os::fd::IntoRawFd;
        use std::process::{Command, Stdio};

        let mut child = Command::new("true")
            .stdout(Stdio::piped())
            .spawn()
            .unwrap();
        let fd = child.stdout.take().unwrap().into_raw_fd();
        child.wait().unwrap();
        ChannelStream::from_inherited_fd(fd).unwrap()
    }

    #[cfg(unix)]
    #[test]
    fn pipe_channel_without_timeout_reads_to_eof() {
        let mut reader = FrameReader::for_channel(inherited_pipe(), FrameConfig::default()).unwrap();
        assert!(matches!(reader.read_frame(), Err(FrameError::ConnectionClosed)));
    }

    #[cfg(unix)]
    #[test]
    fn timeout_on_pipe_channel_is_an_error() {
        let config = FrameConfig {
            read_timeout: Some(std::time::Duration::from_secs(1)),
            ..FrameConfig::default()
        };
        assert!(matches!(
            FrameReader::for_channel(inherited_pipe(), config),
            Err(FrameError::Io(_))
        ));
    }
}
