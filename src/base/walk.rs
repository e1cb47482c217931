//! The structural walker.
//!
//! The structure block carries no length for a node or its properties, so the only way to find
//! where a node ends is to visit every token inside it. The walker does exactly that and
//! reports where the stream resumes. It is used to validate a whole tree and, by the lookup
//! engine, to skip over subtrees that cannot match.

use crate::error::{DevTreeError, Result};

use fallible_iterator::FallibleIterator;

use super::parse::{DevTreeParseIter, ParsedTok};
use super::DevTree;

/// A position inside the structure block, as a byte offset from its start.
///
/// Cursors handed out by this crate always point at a token boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StructCursor(usize);

impl StructCursor {
    /// The first token of the structure block, the root node's BEGIN_NODE.
    pub const ROOT: StructCursor = StructCursor(0);

    pub(crate) const fn new(offset: usize) -> Self {
        Self(offset)
    }

    #[inline]
    pub const fn offset(&self) -> usize {
        self.0
    }
}

/// Walk the tokens at `cursor` until the end of the current nesting level.
///
/// `depth` is the nesting depth `cursor` sits at: 0 for the top of the structure block, 1 for
/// the body of the root node, and so on.
///
/// Returns the cursor just past the END_NODE that closes the current level, or `None` when
/// the walk started at depth 0 and reached the END token. Nested nodes are walked with an
/// explicit counter rather than recursion, so nesting depth is bounded only by `usize`.
///
/// Errors with [`DevTreeError::MalformedStructure`] on an END_NODE at depth 0, an END inside an
/// open node, an unknown token, or a stream that runs out before END.
pub fn walk(dt: &DevTree<'_>, cursor: StructCursor, depth: usize) -> Result<Option<StructCursor>> {
    let mut iter = DevTreeParseIter::at(dt.structure(), cursor.offset());
    let mut nested = 0usize;

    loop {
        let tok_off = iter.offset();
        match iter.next()? {
            Some(ParsedTok::BeginNode(node)) => {
                trace!("{:indent$}node {}", "", node.name, indent = depth + nested);
                nested += 1;
            }
            Some(ParsedTok::EndNode) => {
                if nested > 0 {
                    nested -= 1;
                    trace!("{:indent$}end node", "", indent = depth + nested);
                    continue;
                }
                if depth == 0 {
                    return Err(DevTreeError::malformed(
                        tok_off,
                        "END_NODE without a matching BEGIN_NODE",
                    ));
                }
                return Ok(Some(StructCursor(iter.offset())));
            }
            Some(ParsedTok::Prop(prop)) => {
                let name = dt.string_at(prop.name_offset)?;
                trace!(
                    "{:indent$}property {} ({} bytes)",
                    "",
                    name,
                    prop.value.len(),
                    indent = depth + nested
                );
            }
            Some(ParsedTok::Nop) => {}
            None => {
                if depth == 0 && nested == 0 {
                    trace!("end of structure block");
                    return Ok(None);
                }
                return Err(DevTreeError::malformed(
                    tok_off,
                    "END token inside an open node",
                ));
            }
        }
    }
}

/// Skip the node whose body starts at `body` and return the cursor just past its END_NODE.
pub fn skip_subtree(dt: &DevTree<'_>, body: StructCursor) -> Result<StructCursor> {
    walk(dt, body, 1)?.ok_or(DevTreeError::malformed(
        body.offset(),
        "node body ended without END_NODE",
    ))
}
