use std::ffi::CStr;
use std::fmt;

/// A request key exactly as the parent sent it, up to its first NUL.
///
/// Keys are bytes on the wire. [`Key::to_str`] gives the text form only
/// when those bytes are valid UTF-8, so two distinct keys never compare
/// equal after decoding.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key<'a> {
    raw: &'a CStr,
}

impl<'a> Key<'a> {
    pub fn new(raw: &'a CStr) -> Self {
        Self { raw }
    }

    /// The key bytes without the terminator.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.raw.to_bytes()
    }

    pub fn as_c_str(&self) -> &'a CStr {
        self.raw
    }

    /// The key as text, `None` if it is not valid UTF-8.
    pub fn to_str(&self) -> Option<&'a str> {
        self.raw.to_str().ok()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

impl PartialEq<str> for Key<'_> {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<&str> for Key<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<[u8]> for Key<'_> {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_bytes() == other
    }
}

/// Text keys print as-is; anything else is byte-escaped.
impl fmt::Display for Key<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_str() {
            Some(text) => f.write_str(text),
            None => write!(f, "{}", self.as_bytes().escape_ascii()),
        }
    }
}

impl fmt::Debug for Key<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key(\"{self}\")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(raw: &[u8]) -> Key<'_> {
        Key::new(CStr::from_bytes_with_nul(raw).unwrap())
    }

    #[test]
    fn text_keys_compare_with_str() {
        let k = key(b"user@example.com\0");
        assert_eq!(k, "user@example.com");
        assert_eq!(k.to_str(), Some("user@example.com"));
        assert_eq!(k.to_string(), "user@example.com");
    }

    #[test]
    fn invalid_utf8_stays_distinct() {
        let ff = key(b"\xff\0");
        let fe = key(b"\xfe\0");
        let replacement = key("\u{FFFD}\0".as_bytes());

        assert_ne!(ff, fe);
        assert_eq!(ff.to_str(), None);
        assert!(ff != "\u{FFFD}");
        assert_eq!(replacement, "\u{FFFD}");
        assert_eq!(ff.to_string(), "\\xff");
        assert_eq!(ff, b"\xff"[..]);
    }

    #[test]
    fn empty_key() {
        let k = key(b"\0");
        assert!(k.is_empty());
        assert_eq!(k.as_bytes(), b"");
    }
}
