/// Bytes a looked-up or fetched value may occupy, terminator included.
pub const VALUE_CAPACITY: usize = 4096;

/// Errors writing a value into a [`ValueBuffer`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    /// The value plus its NUL terminator exceeds the capacity.
    #[error("value too long ({len} bytes, max {max} before the terminator)")]
    TooLong { len: usize, max: usize },

    /// The value would be cut short by an embedded NUL on the wire.
    #[error("value contains a NUL byte at offset {0}")]
    InteriorNul(usize),
}

/// Bounded output slot a LOOKUP or FETCH handler writes its value into.
///
/// The dispatcher clears it before every call and only reads it when the
/// handler answers [`Outcome::Found`](crate::Outcome::Found).
#[derive(Debug)]
pub struct ValueBuffer {
    data: Vec<u8>,
    capacity: usize,
}

impl ValueBuffer {
    pub fn new() -> Self {
        Self::with_capacity(VALUE_CAPACITY)
    }

    /// A buffer holding at most `capacity - 1` value bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Replace the contents with `value`.
    pub fn set(&mut self, value: impl AsRef<[u8]>) -> Result<(), ValueError> {
        let value = value.as_ref();
        let max = self.capacity.saturating_sub(1);
        if value.len() > max {
            return Err(ValueError::TooLong {
                len: value.len(),
                max,
            });
        }
        if let Some(offset) = value.iter().position(|&b| b == 0) {
            return Err(ValueError::InteriorNul(offset));
        }
        self.data.clear();
        self.data.extend_from_slice(value);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// The value without its terminator.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ValueBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_and_replaces() {
        let mut buf = ValueBuffer::new();
        buf.set("10.0.0.1").unwrap();
        assert_eq!(buf.as_bytes(), b"10.0.0.1");
        buf.set("x").unwrap();
        assert_eq!(buf.as_bytes(), b"x");
        assert_eq!(buf.capacity(), VALUE_CAPACITY);
    }

    #[test]
    fn leaves_room_for_terminator() {
        let mut buf = ValueBuffer::with_capacity(4);
        buf.set("abc").unwrap();
        assert_eq!(
            buf.set("abcd"),
            Err(ValueError::TooLong { len: 4, max: 3 })
        );
        assert_eq!(buf.as_bytes(), b"abc", "failed set keeps old value");
    }

    #[test]
    fn rejects_interior_nul() {
        let mut buf = ValueBuffer::new();
        assert_eq!(buf.set(b"ab\0cd"), Err(ValueError::InteriorNul(2)));
    }
}
