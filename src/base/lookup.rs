//! Path based lookup over the structure block.
//!
//! A lookup makes a single forward pass. It only descends into nodes on the path being
//! searched for; every other node is skipped with the structural walker. Nothing is copied:
//! results point into the original blob.

use crate::bstr::ByteStr;
use crate::error::Result;

use fallible_iterator::FallibleIterator;

use super::parse::{DevTreeParseIter, ParsedTok};
use super::prop::PropValue;
use super::walk::{skip_subtree, StructCursor};
use super::DevTree;

/// How the final segment of a path is compared against node and property names.
///
/// Every segment before the final one is always compared exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// The name must equal the segment.
    Exact,
    /// The segment must be a prefix of the name, so `/memory` finds `memory@80000000`.
    Prefix,
}

impl MatchMode {
    #[inline]
    fn matches(self, segment: ByteStr<'_>, name: ByteStr<'_>) -> bool {
        match self {
            MatchMode::Exact => segment == name,
            MatchMode::Prefix => segment.is_prefix_of(name),
        }
    }
}

/// The outcome of a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupResult<'dt> {
    /// The path named a property.
    PropValue(PropValue<'dt>),
    /// The path named a node. The cursor points at the node's body (its first token after the
    /// name) and can be passed to [`DevTree::lookup_at`] to search inside it.
    Subtree(StructCursor),
    /// Nothing at the current level matched.
    NoMatch,
}

impl<'dt> LookupResult<'dt> {
    #[must_use]
    pub fn prop(self) -> Option<PropValue<'dt>> {
        match self {
            LookupResult::PropValue(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn subtree(self) -> Option<StructCursor> {
        match self {
            LookupResult::Subtree(cursor) => Some(cursor),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_match(&self) -> bool {
        !matches!(self, LookupResult::NoMatch)
    }
}

/// Split off the next `/` separated segment. The remainder is `None` when the segment is the
/// final one.
fn next_segment(path: &str) -> (&str, Option<&str>) {
    match path.find('/') {
        Some(i) => (&path[..i], Some(&path[i + 1..])),
        None => (path, None),
    }
}

/// Search for `path` starting at `cursor`.
///
/// The path is consumed one segment per nesting level. At each level the tokens are scanned in
/// stream order and the first name that matches wins:
///
/// - a matching node on the final segment yields [`LookupResult::Subtree`];
/// - a matching node on any other segment is descended into with the rest of the path. Its
///   siblings are not considered again, even if that descent finds nothing;
/// - a matching property on the final segment yields [`LookupResult::PropValue`];
/// - reaching the END_NODE (or END) of the level yields [`LookupResult::NoMatch`].
///
/// The root node has an empty name, so a lookup from [`StructCursor::ROOT`] starts with `/`:
/// the empty first segment enters the root, e.g. `/#address-cells` or `/cpus/cpu@0`.
/// Lookups from a subtree cursor start directly with a child name, e.g. `device_type`.
///
/// `mode` applies to the final segment only.
pub fn lookup<'dt>(
    dt: &DevTree<'dt>,
    cursor: StructCursor,
    path: &str,
    mode: MatchMode,
) -> Result<LookupResult<'dt>> {
    let mut iter = DevTreeParseIter::at(dt.structure(), cursor.offset());
    let mut path = path;

    'level: loop {
        let (segment, rest) = next_segment(path);
        let segment = ByteStr::from(segment);
        let is_final = rest.is_none();
        let segment_mode = if is_final { mode } else { MatchMode::Exact };

        loop {
            match iter.next()? {
                Some(ParsedTok::BeginNode(node)) => {
                    let body = StructCursor::new(iter.offset());
                    if segment_mode.matches(segment, node.name) {
                        match rest {
                            None => {
                                debug!("lookup: node {} at {:#x}", node.name, body.offset());
                                return Ok(LookupResult::Subtree(body));
                            }
                            Some(rest) => {
                                debug!("lookup: descending into {}", node.name);
                                path = rest;
                                continue 'level;
                            }
                        }
                    }
                    let next = skip_subtree(dt, body)?;
                    iter = DevTreeParseIter::at(dt.structure(), next.offset());
                }
                Some(ParsedTok::Prop(prop)) => {
                    if !is_final {
                        continue;
                    }
                    let name = dt.string_at(prop.name_offset)?;
                    if segment_mode.matches(segment, name) {
                        debug!("lookup: property {} ({} bytes)", name, prop.value.len());
                        return Ok(LookupResult::PropValue(PropValue::new(prop.value)));
                    }
                }
                Some(ParsedTok::Nop) => {}
                Some(ParsedTok::EndNode) | None => {
                    debug!("lookup: no match for {}", segment);
                    return Ok(LookupResult::NoMatch);
                }
            }
        }
    }
}
