use std::io::{Read, Write};

use bytes::{BufMut, BytesMut};
use serde::Serialize;
use tableproc_frame::{Frame, FrameConfig, FrameReader, FrameWriter, PayloadCursor};
use tableproc_transport::ChannelStream;
use tracing::debug;

use crate::error::ClientError;
use crate::opcode::{Opcode, PROC_TABLE_API_VERSION, PROC_TABLE_OK};
use crate::outcome::Outcome;

type Result<T> = std::result::Result<T, ClientError>;

/// Reply to LOOKUP or FETCH.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub outcome: Outcome,
    /// Present exactly when `outcome` is [`Outcome::Found`].
    pub value: Option<String>,
}

/// The parent side of a table session.
///
/// Each call sends one request and blocks for its reply, checking that the
/// reply has exactly the shape its request calls for.
pub struct TableClient<R, W> {
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
}

impl TableClient<ChannelStream, ChannelStream> {
    pub fn over_channel(channel: ChannelStream, config: FrameConfig) -> Result<Self> {
        let read_half = channel.try_clone()?;
        Ok(Self {
            reader: FrameReader::for_channel(read_half, config.clone())?,
            writer: FrameWriter::for_channel(channel, config)?,
        })
    }
}

impl<R: Read, W: Write> TableClient<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: FrameReader::new(reader),
            writer: FrameWriter::new(writer),
        }
    }

    /// Send OPEN with the current protocol version.
    pub fn open(&mut self) -> Result<()> {
        self.open_version(PROC_TABLE_API_VERSION)
    }

    /// Send OPEN with an explicit version and wait for the empty ack.
    pub fn open_version(&mut self, version: u32) -> Result<()> {
        let reply = self.call(Opcode::Open, &version.to_ne_bytes())?;
        PayloadCursor::new(&reply.payload).finish()?;
        Ok(())
    }

    pub fn update(&mut self) -> Result<Outcome> {
        let reply = self.call(Opcode::Update, &[])?;
        result_only(&reply)
    }

    pub fn check(&mut self, kind: i32, key: &str) -> Result<Outcome> {
        let payload = keyed_payload(kind, key)?;
        let reply = self.call(Opcode::Check, &payload)?;
        result_only(&reply)
    }

    pub fn lookup(&mut self, kind: i32, key: &str) -> Result<Answer> {
        let payload = keyed_payload(kind, key)?;
        let reply = self.call(Opcode::Lookup, &payload)?;
        result_with_value(&reply)
    }

    pub fn fetch(&mut self, kind: i32) -> Result<Answer> {
        let reply = self.call(Opcode::Fetch, &kind.to_ne_bytes())?;
        result_with_value(&reply)
    }

    /// Send CLOSE. The backend does not answer it.
    pub fn close(mut self) -> Result<()> {
        self.writer.send(&Frame::new(Opcode::Close.code(), bytes::Bytes::new()))?;
        debug!("sent close");
        Ok(())
    }

    /// Send a raw frame and wait for one reply, bypassing request encoding.
    pub fn call_raw(&mut self, kind: u32, payload: &[u8]) -> Result<Frame> {
        self.writer.send(&Frame::new(kind, payload.to_vec()))?;
        let reply = self.reader.read_frame()?;
        if reply.kind != PROC_TABLE_OK {
            return Err(ClientError::UnexpectedReply(reply.kind));
        }
        Ok(reply)
    }

    fn call(&mut self, opcode: Opcode, payload: &[u8]) -> Result<Frame> {
        debug!(%opcode, len = payload.len(), "sending request");
        self.call_raw(opcode.code(), payload)
    }
}

fn keyed_payload(kind: i32, key: &str) -> Result<BytesMut> {
    if key.as_bytes().contains(&0) {
        return Err(ClientError::InvalidKey);
    }
    let mut payload = BytesMut::with_capacity(4 + key.len() + 1);
    payload.put_slice(&kind.to_ne_bytes());
    payload.put_slice(key.as_bytes());
    payload.put_u8(0);
    Ok(payload)
}

fn take_outcome(cursor: &mut PayloadCursor<'_>) -> Result<Outcome> {
    let code = cursor.take_i32()?;
    Outcome::from_code(code).ok_or(ClientError::InvalidResult(code))
}

fn result_only(reply: &Frame) -> Result<Outcome> {
    let mut cursor = PayloadCursor::new(&reply.payload);
    let outcome = take_outcome(&mut cursor)?;
    cursor.finish()?;
    Ok(outcome)
}

fn result_with_value(reply: &Frame) -> Result<Answer> {
    let mut cursor = PayloadCursor::new(&reply.payload);
    let outcome = take_outcome(&mut cursor)?;
    if !outcome.is_found() {
        cursor.finish()?;
        return Ok(Answer {
            outcome,
            value: None,
        });
    }

    let raw = cursor.take_rest();
    let value = match raw.split_last() {
        Some((0, value)) if !value.contains(&0) => value,
        _ => return Err(ClientError::UnterminatedValue),
    };
    Ok(Answer {
        outcome,
        value: Some(String::from_utf8_lossy(value).into_owned()),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::Bytes;
    use tableproc_frame::{encode_frame, FrameError, MAX_FRAME_SIZE};

    use super::*;

    fn client_with_replies(replies: &[&[u8]]) -> TableClient<Cursor<Vec<u8>>, Vec<u8>> {
        let mut wire = BytesMut::new();
        for payload in replies {
            encode_frame(
                &Frame::new(PROC_TABLE_OK, payload.to_vec()),
                MAX_FRAME_SIZE,
                &mut wire,
            )
            .unwrap();
        }
        TableClient::new(Cursor::new(wire.to_vec()), Vec::new())
    }

    fn found(value: &[u8]) -> Vec<u8> {
        let mut payload = 1i32.to_ne_bytes().to_vec();
        payload.extend_from_slice(value);
        payload
    }

    #[test]
    fn decodes_affirmative_lookup() {
        let reply = found(b"10.0.0.1\0");
        let mut client = client_with_replies(&[reply.as_slice()]);

        let answer = client.lookup(8, "relay").unwrap();
        assert_eq!(answer.outcome, Outcome::Found);
        assert_eq!(answer.value.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn encodes_keyed_request() {
        let mut client = client_with_replies(&[&0i32.to_ne_bytes()]);
        assert_eq!(client.check(1, "user@example.com").unwrap(), Outcome::NotFound);

        let sent = client.writer.get_ref().clone();
        let mut sent = BytesMut::from(sent.as_slice());
        let frame = tableproc_frame::decode_frame(&mut sent, MAX_FRAME_SIZE)
            .unwrap()
            .unwrap();
        assert_eq!(frame.kind, Opcode::Check.code());
        assert_eq!(&frame.payload[..4], &1i32.to_ne_bytes());
        assert_eq!(&frame.payload[4..], b"user@example.com\0");
    }

    #[test]
    fn rejects_value_on_negative_reply() {
        let mut reply = 0i32.to_ne_bytes().to_vec();
        reply.extend_from_slice(b"junk\0");
        let mut client = client_with_replies(&[reply.as_slice()]);

        let err = client.fetch(0).unwrap_err();
        assert!(matches!(err, ClientError::Frame(FrameError::TrailingData { remaining: 5 })));
    }

    #[test]
    fn rejects_unterminated_value() {
        let reply = found(b"no-terminator");
        let mut client = client_with_replies(&[reply.as_slice()]);
        assert!(matches!(
            client.fetch(0).unwrap_err(),
            ClientError::UnterminatedValue
        ));
    }

    #[test]
    fn rejects_out_of_range_result() {
        let mut client = client_with_replies(&[&7i32.to_ne_bytes()]);
        assert!(matches!(
            client.update().unwrap_err(),
            ClientError::InvalidResult(7)
        ));
    }

    #[test]
    fn rejects_key_with_nul() {
        let mut client = client_with_replies(&[]);
        assert!(matches!(
            client.check(0, "a\0b").unwrap_err(),
            ClientError::InvalidKey
        ));
    }

    #[test]
    fn open_wants_empty_ack() {
        let mut client = client_with_replies(&[b"", &1i32.to_ne_bytes()]);
        client.open().unwrap();
        let err = client.open().unwrap_err();
        assert!(matches!(err, ClientError::Frame(FrameError::TrailingData { remaining: 4 })));
    }

    #[test]
    fn reply_type_must_be_ok() {
        let mut wire = BytesMut::new();
        encode_frame(&Frame::new(1, Bytes::new()), MAX_FRAME_SIZE, &mut wire).unwrap();
        let mut client = TableClient::new(Cursor::new(wire.to_vec()), Vec::<u8>::new());
        assert!(matches!(
            client.update().unwrap_err(),
            ClientError::UnexpectedReply(1)
        ));
    }
}
