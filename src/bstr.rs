//! Non-owning views over names stored in the blob.
use core::fmt;
use core::str::from_utf8;

use crate::error::Result;
use crate::priv_util::SliceRead;

/// A borrowed run of bytes, such as a node name, a property name or a path segment.
///
/// The view never owns or copies its bytes; it is only valid as long as the buffer it was
/// taken from.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ByteStr<'a>(&'a [u8]);

impl<'a> ByteStr<'a> {
    #[inline]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self(bytes)
    }

    /// Take the NUL-terminated string starting at `pos` in `buf`, without its terminator.
    pub fn from_nul_terminated(buf: &'a [u8], pos: usize) -> Result<Self> {
        Ok(Self(buf.read_bstring0(pos)?))
    }

    #[inline]
    pub const fn as_bytes(&self) -> &'a [u8] {
        self.0
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `self` is a prefix of `subject`. A prefix longer than its subject never matches.
    #[inline]
    pub fn is_prefix_of(&self, subject: ByteStr<'_>) -> bool {
        subject.0.starts_with(self.0)
    }

    pub fn as_str(&self) -> Result<&'a str> {
        Ok(from_utf8(self.0)?)
    }
}

impl<'a> From<&'a str> for ByteStr<'a> {
    fn from(s: &'a str) -> Self {
        Self(s.as_bytes())
    }
}

impl<'a> From<&'a [u8]> for ByteStr<'a> {
    fn from(s: &'a [u8]) -> Self {
        Self(s)
    }
}

impl PartialEq<str> for ByteStr<'_> {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<&str> for ByteStr<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl fmt::Debug for ByteStr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match from_utf8(self.0) {
            Ok(s) => write!(f, "{:?}", s),
            Err(_) => write!(f, "{:?}", self.0),
        }
    }
}

impl fmt::Display for ByteStr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02x}", b)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_needs_equal_lengths() {
        assert_eq!(ByteStr::from("memory"), ByteStr::from("memory"));
        assert_ne!(ByteStr::from("mem"), ByteStr::from("memory"));
        assert_ne!(ByteStr::from("memory"), ByteStr::from("memorx"));
    }

    #[test]
    fn prefix() {
        let name = ByteStr::from("memory0");
        assert!(ByteStr::from("mem").is_prefix_of(name));
        assert!(ByteStr::from("").is_prefix_of(name));
        assert!(name.is_prefix_of(name));
        assert!(!ByteStr::from("memo").is_prefix_of(ByteStr::from("mem")));
        assert!(!ByteStr::from("cpu").is_prefix_of(name));
    }

    #[test]
    fn from_nul_terminated() {
        let buf = b"#size-cells\0reg\0";
        let s = ByteStr::from_nul_terminated(buf, 0).unwrap();
        assert_eq!(s, "#size-cells");
        assert_eq!(s.len(), 11);
        assert_eq!(ByteStr::from_nul_terminated(buf, 12).unwrap(), "reg");
        assert!(ByteStr::from_nul_terminated(b"abc", 0).is_err());
    }
}
