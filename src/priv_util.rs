use core::mem::size_of;

use crate::spec::FDT_TOKEN_SIZE;

/// A read that would leave the slice it was issued against.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SliceReadError {
    /// `len` bytes at `offset` do not fit in the slice.
    UnexpectedEndOfInput { offset: usize, len: usize },
}

pub(crate) type SliceReadResult<T> = Result<T, SliceReadError>;

pub(crate) trait SliceRead<'a> {
    fn read_be_u32(&self, pos: usize) -> SliceReadResult<u32>;
    fn read_be_u64(&self, pos: usize) -> SliceReadResult<u64>;
    fn read_bytes(&self, pos: usize, len: usize) -> SliceReadResult<&'a [u8]>;
    fn read_bstring0(&self, pos: usize) -> SliceReadResult<&'a [u8]>;
}

macro_rules! be_read {
    ( $buf:ident, $type:ident , $off:expr ) => {{
        let bytes = $buf.read_bytes($off, size_of::<$type>())?;
        let mut raw = [0u8; size_of::<$type>()];
        raw.copy_from_slice(bytes);
        Ok($type::from_be_bytes(raw))
    }};
}

impl<'a> SliceRead<'a> for &'a [u8] {
    #[inline]
    fn read_be_u32(&self, pos: usize) -> SliceReadResult<u32> {
        be_read!(self, u32, pos)
    }

    #[inline]
    fn read_be_u64(&self, pos: usize) -> SliceReadResult<u64> {
        be_read!(self, u64, pos)
    }

    #[inline]
    fn read_bytes(&self, pos: usize, len: usize) -> SliceReadResult<&'a [u8]> {
        pos.checked_add(len)
            .and_then(|end| self.get(pos..end))
            .ok_or(SliceReadError::UnexpectedEndOfInput { offset: pos, len })
    }

    fn read_bstring0(&self, pos: usize) -> SliceReadResult<&'a [u8]> {
        let tail = self
            .get(pos..)
            .ok_or(SliceReadError::UnexpectedEndOfInput { offset: pos, len: 1 })?;
        match tail.iter().position(|&b| b == 0) {
            Some(nul) => Ok(&tail[..nul]),
            None => Err(SliceReadError::UnexpectedEndOfInput {
                offset: pos,
                len: tail.len() + 1,
            }),
        }
    }
}

/// Round an offset up to the next token boundary.
#[inline]
pub(crate) const fn align_to_token(n: usize) -> usize {
    (n + FDT_TOKEN_SIZE - 1) & !(FDT_TOKEN_SIZE - 1)
}
