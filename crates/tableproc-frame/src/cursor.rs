use crate::error::{FrameError, Result};

/// Bounds-checked read cursor over one message payload.
///
/// Fields are taken front to back; a take that asks for more than what is
/// left fails with [`FrameError::ShortPayload`] and leaves the cursor
/// where it was. [`finish`](Self::finish) then asserts nothing was left
/// behind, so each opcode only has to state its own shape.
#[derive(Debug)]
pub struct PayloadCursor<'a> {
    rest: &'a [u8],
}

impl<'a> PayloadCursor<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self { rest: payload }
    }

    /// Bytes not yet taken.
    pub fn remaining(&self) -> usize {
        self.rest.len()
    }

    /// The untaken tail, without consuming it.
    pub fn peek_rest(&self) -> &'a [u8] {
        self.rest
    }

    /// Remove and return the next `n` bytes.
    pub fn take_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.rest.len() {
            return Err(FrameError::ShortPayload {
                wanted: n,
                remaining: self.rest.len(),
            });
        }
        let (head, tail) = self.rest.split_at(n);
        self.rest = tail;
        Ok(head)
    }

    /// Remove and return a native-endian `u32`.
    pub fn take_u32(&mut self) -> Result<u32> {
        let raw = self.take_array::<4>()?;
        Ok(u32::from_ne_bytes(raw))
    }

    /// Remove and return a native-endian `i32`.
    pub fn take_i32(&mut self) -> Result<i32> {
        let raw = self.take_array::<4>()?;
        Ok(i32::from_ne_bytes(raw))
    }

    /// Remove and return everything that is left.
    pub fn take_rest(&mut self) -> &'a [u8] {
        std::mem::take(&mut self.rest)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.take_bytes(N)?;
        let mut raw = [0u8; N];
        raw.copy_from_slice(bytes);
        Ok(raw)
    }

    /// Assert the payload was consumed exactly.
    pub fn finish(self) -> Result<()> {
        if self.rest.is_empty() {
            Ok(())
        } else {
            Err(FrameError::TrailingData {
                remaining: self.rest.len(),
            })
        }
    }
}
