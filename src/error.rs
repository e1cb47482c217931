//! Errors reported by this library

use crate::priv_util::SliceReadError;
use core::fmt;
use core::result;
use core::str::Utf8Error;

/// Every condition under which the device tree cannot be trusted.
///
/// A lookup that simply finds nothing is not an error; see
/// [`LookupResult::NoMatch`](crate::base::LookupResult::NoMatch).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevTreeError {
    InvalidParameter(&'static str),

    /// The magic number FDT_MAGIC was not found at the start of the
    /// header. Carries the value that was found instead.
    InvalidMagicNumber(u32),

    /// The token stream violates the nesting rules (a close without an open, END inside an open
    /// node, a stream that runs out before END) or contains an unknown token.
    ///
    /// `offset` is relative to the start of the structure block.
    MalformedStructure {
        offset: usize,
        reason: &'static str,
    },

    /// Reading `len` bytes at `offset` would leave the region the read was issued against
    /// (the blob, the structure block, the strings block or a property value).
    UnboundedRead { offset: usize, len: usize },

    /// The tree is well formed but describes a machine this kernel cannot run on.
    UnsupportedConfiguration(&'static str),

    /// A string in the blob that was supposed to be ASCII is not valid UTF-8.
    StrError(Utf8Error),
}

impl DevTreeError {
    pub(crate) const fn malformed(offset: usize, reason: &'static str) -> Self {
        DevTreeError::MalformedStructure { offset, reason }
    }
}

impl From<SliceReadError> for DevTreeError {
    fn from(e: SliceReadError) -> DevTreeError {
        match e {
            SliceReadError::UnexpectedEndOfInput { offset, len } => {
                DevTreeError::UnboundedRead { offset, len }
            }
        }
    }
}

impl From<Utf8Error> for DevTreeError {
    fn from(e: Utf8Error) -> DevTreeError {
        DevTreeError::StrError(e)
    }
}

/// The result of a parse.
pub type Result<T> = core::result::Result<T, DevTreeError>;

impl fmt::Display for DevTreeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        match *self {
            DevTreeError::InvalidParameter(err) => write!(f, "Invalid parameter supplied: {}", err),
            DevTreeError::InvalidMagicNumber(found) => write!(
                f,
                "Device tree contains invalid magic number {:#010x}.",
                found
            ),
            DevTreeError::MalformedStructure { offset, reason } => write!(
                f,
                "Malformed structure block at offset {:#x}: {}",
                offset, reason
            ),
            DevTreeError::UnboundedRead { offset, len } => write!(
                f,
                "Read of {} bytes at offset {:#x} exceeds its region.",
                len, offset
            ),
            DevTreeError::UnsupportedConfiguration(err) => {
                write!(f, "Unsupported configuration: {}", err)
            }
            DevTreeError::StrError(utf_err) => {
                write!(f, "Failed to parse device tree string: {}", utf_err)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DevTreeError {}
