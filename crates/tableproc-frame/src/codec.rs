use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// imsg header: type (4) + len (2) + flags (2) + peerid (4) + pid (4).
pub const HEADER_SIZE: usize = 16;

/// Largest frame imsg accepts, header included.
pub const MAX_FRAME_SIZE: usize = 16384;

/// One complete message: opcode plus payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Message type. Requests carry an opcode, replies carry `PROC_TABLE_OK`.
    pub kind: u32,
    /// Opaque peer id echoed by the transport.
    pub peer_id: u32,
    /// Sender pid as stamped by the parent; informational only.
    pub pid: u32,
    /// The message payload.
    pub payload: Bytes,
}

impl Frame {
    /// Create a frame with zero peer id and pid, as this side always sends.
    pub fn new(kind: u32, payload: impl Into<Bytes>) -> Self {
        Self {
            kind,
            peer_id: 0,
            pid: 0,
            payload: payload.into(),
        }
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Encode a frame into the wire format.
///
/// ```text
/// ┌───────────┬──────────┬──────────┬───────────┬──────────┬───────────┐
/// │ type (4B) │ len (2B) │ flags    │ peerid    │ pid (4B) │ payload   │
/// │           │ hdr+data │ (2B) = 0 │ (4B)      │          │           │
/// └───────────┴──────────┴──────────┴───────────┴──────────┴───────────┘
/// ```
///
/// All integers are native-endian, as both ends run on the same host.
pub fn encode_frame(frame: &Frame, max_frame: usize, dst: &mut BytesMut) -> Result<()> {
    let total = frame.wire_size();
    let limit = max_frame.min(u16::MAX as usize);
    if total > limit {
        return Err(FrameError::FrameTooLarge {
            size: total,
            max: limit,
        });
    }

    dst.reserve(total);
    dst.put_slice(&frame.kind.to_ne_bytes());
    dst.put_slice(&(total as u16).to_ne_bytes());
    dst.put_slice(&0u16.to_ne_bytes());
    dst.put_slice(&frame.peer_id.to_ne_bytes());
    dst.put_slice(&frame.pid.to_ne_bytes());
    dst.put_slice(&frame.payload);
    Ok(())
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
pub fn decode_frame(src: &mut BytesMut, max_frame: usize) -> Result<Option<Frame>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    let kind = read_u32(&src[0..4]);
    let total = u16::from_ne_bytes([src[4], src[5]]) as usize;
    let peer_id = read_u32(&src[8..12]);
    let pid = read_u32(&src[12..16]);

    if total < HEADER_SIZE {
        return Err(FrameError::InvalidLength {
            len: total,
            header: HEADER_SIZE,
        });
    }
    if total > max_frame {
        return Err(FrameError::FrameTooLarge {
            size: total,
            max: max_frame,
        });
    }
    if src.len() < total {
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(total - HEADER_SIZE).freeze();

    Ok(Some(Frame {
        kind,
        peer_id,
        pid,
        payload,
    }))
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(bytes);
    u32::from_ne_bytes(raw)
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum frame size in bytes, header included. Default: 16 KiB.
    pub max_frame_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_size: MAX_FRAME_SIZE,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
