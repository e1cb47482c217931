//! Low level flattened device tree parsing functions.
//!

use core::mem::size_of;

use num_traits::FromPrimitive;

use crate::bstr::ByteStr;
use crate::error::{DevTreeError, Result};
use crate::priv_util::{align_to_token, SliceRead};
use crate::spec::{fdt_prop_header, FdtTok, FDT_TOKEN_SIZE};

use fallible_iterator::FallibleIterator;

/// This function implements the logic to tokenize the device tree's main structure block.
///
/// `buf` is the structure block, bounded by the size the header declares for it. This function
/// will return the next [`ParsedTok`] if one exists, or `None` once the END token is read. If it
/// succeeds, `off` is moved to the start of the next token, past any padding.
///
/// Errors:
///
/// - a token that would start at or past the end of `buf` means the stream ran out before it
///   was terminated: [`DevTreeError::MalformedStructure`].
/// - an unknown token value: [`DevTreeError::MalformedStructure`].
/// - a token, node name, property header or property value (with its padding) that starts
///   inside `buf` but does not fit: [`DevTreeError::UnboundedRead`].
pub fn next_devtree_token<'a>(buf: &'a [u8], off: &mut usize) -> Result<Option<ParsedTok<'a>>> {
    debug_assert!(*off % FDT_TOKEN_SIZE == 0);

    if *off >= buf.len() {
        return Err(DevTreeError::malformed(
            *off,
            "structure block ended before the END token",
        ));
    }

    let tok_off = *off;
    let fdt_tok_val = buf.read_be_u32(tok_off)?;
    *off += FDT_TOKEN_SIZE;

    match FromPrimitive::from_u32(fdt_tok_val) {
        Some(FdtTok::BeginNode) => {
            // Read the name (or return an error if the device tree is incorrectly formatted).
            let name = ByteStr::from_nul_terminated(buf, *off)?;

            // Move to the end of name (adding null byte), then back to u32 alignment.
            *off = padded_end(buf, *off, name.len() + 1)?;

            Ok(Some(ParsedTok::BeginNode(ParsedBeginNode { name })))
        }
        Some(FdtTok::Prop) => {
            let prop_len =
                buf.read_be_u32(*off + offset_of!(fdt_prop_header, len))? as usize;
            let name_offset =
                buf.read_be_u32(*off + offset_of!(fdt_prop_header, nameoff))? as usize;

            // Move offset past prop header
            *off += size_of::<fdt_prop_header>();
            let value = buf.read_bytes(*off, prop_len)?;

            // Move the offset past the prop data and its padding.
            *off = padded_end(buf, *off, prop_len)?;

            Ok(Some(ParsedTok::Prop(ParsedProp { value, name_offset })))
        }
        Some(FdtTok::EndNode) => Ok(Some(ParsedTok::EndNode)),
        Some(FdtTok::Nop) => Ok(Some(ParsedTok::Nop)),
        Some(FdtTok::End) => Ok(None),
        None => Err(DevTreeError::malformed(tok_off, "unknown structure token")),
    }
}

/// The aligned end of a `len` byte region at `start`, which must lie within `buf`.
fn padded_end(buf: &[u8], start: usize, len: usize) -> Result<usize> {
    let end = start
        .checked_add(len)
        .map(align_to_token)
        .filter(|&end| end <= buf.len())
        .ok_or(DevTreeError::UnboundedRead { offset: start, len })?;
    Ok(end)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedBeginNode<'a> {
    pub name: ByteStr<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedProp<'a> {
    /// The property value with its true, unpadded length.
    pub value: &'a [u8],
    /// Offset of the property name within the strings block.
    pub name_offset: usize,
}

/// Enumeration of all tokens within a device tree's structure block.
///
/// END is not represented; the parser reports it as the end of the token stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedTok<'a> {
    BeginNode(ParsedBeginNode<'a>),
    EndNode,
    Prop(ParsedProp<'a>),
    Nop,
}

/// A fallible iterator over the raw tokens of a structure block.
#[derive(Debug, Clone, Copy)]
pub struct DevTreeParseIter<'dt> {
    offset: usize,
    buf: &'dt [u8],
}

impl<'dt> DevTreeParseIter<'dt> {
    pub(crate) fn new(buf: &'dt [u8]) -> Self {
        Self::at(buf, 0)
    }

    pub(crate) fn at(buf: &'dt [u8], offset: usize) -> Self {
        Self { offset, buf }
    }

    /// Offset of the next token within the structure block.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl<'dt> FallibleIterator for DevTreeParseIter<'dt> {
    type Error = DevTreeError;
    type Item = ParsedTok<'dt>;

    fn next(&mut self) -> Result<Option<Self::Item>> {
        next_devtree_token(self.buf, &mut self.offset)
    }
}
