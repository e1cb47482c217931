//! Device tree parsing that operates directly on the FDT.
//!
//! # Overview
//!
//! Nothing here builds a tree or allocates. The structure block is decoded token by token, in
//! place, every time it is queried. That suits the handful of queries a kernel makes while it
//! discovers its hardware at boot. It is not meant for hot paths.
//!
//! - [`DevTree`] decodes and validates the header and bounds the structure and strings blocks.
//! - [`walk`](walk::walk) visits every token of a subtree and reports where the stream resumes.
//! - [`lookup`](lookup::lookup) resolves a `/` separated path to a property value or a subtree.
//!
//! # Examples
//!
//! ## Initialization
//!
//! ```ignore
//! use fdt_lookup::base::*;
//!
//! # let fdt: &[u8] = &[];
//! let devtree = DevTree::new(fdt).expect("Buffer does not contain a device tree.");
//! devtree.validate().expect("Device tree is malformed.");
//! ```
//!
//! ## Path lookup
//!
//! ```ignore
//! # use fdt_lookup::base::*;
//! # let devtree = DevTree::new(&[]).unwrap();
//! // Properties of the root node.
//! let cells = devtree
//!     .lookup("/#address-cells", MatchMode::Exact)?
//!     .prop()
//!     .expect("no #address-cells");
//! assert_eq!(cells.get_u32(0)?, 2);
//!
//! // Find the first node whose name starts with "memory", then search inside it.
//! if let Some(memory) = devtree.lookup("/memory", MatchMode::Prefix)?.subtree() {
//!     let reg = devtree.lookup_at(memory, "reg", MatchMode::Exact)?;
//!     println!("{:?}", reg);
//! }
//! ```

pub mod lookup;
pub mod parse;
pub mod walk;

#[doc(hidden)]
pub mod prop;
#[doc(hidden)]
pub mod tree;

#[doc(inline)]
pub use lookup::{LookupResult, MatchMode};
#[doc(inline)]
pub use prop::*;
#[doc(inline)]
pub use tree::*;
#[doc(inline)]
pub use walk::StructCursor;
