//! A flattened device tree parser for the earliest stage of boot.
//!
//! Firmware hands the kernel a Flattened Device Tree blob. Before there is an allocator, a
//! scheduler or a driver model, the kernel needs a few answers from it: how wide addresses
//! are, where memory is. This crate answers such path based queries directly on the blob:
//!
//! - no allocation, no materialized tree, no mutation of the blob;
//! - every read is bounds checked against the block sizes the header declares;
//! - nesting is tracked iteratively, so a deep or corrupt tree cannot exhaust the boot stack;
//! - every failure is returned as a [`DevTreeError`]. Only [`boot::boot`] turns an error into a
//!   halt.
//!
//! ```ignore
//! use fdt_lookup::prelude::*;
//! use fdt_lookup::base::*;
//!
//! # let blob: &[u8] = &[];
//! let devtree = DevTree::new(blob)?;
//! match devtree.lookup("/#address-cells", MatchMode::Exact)? {
//!     LookupResult::PropValue(cells) => assert_eq!(cells.get_u32(0)?, 2),
//!     _ => panic!("no #address-cells"),
//! }
//! ```
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate core;

extern crate endian_type_rs as endian_type;
#[macro_use]
extern crate log;
#[macro_use]
extern crate memoffset;
#[macro_use]
extern crate static_assertions;

pub mod base;
pub mod boot;
pub mod bstr;
pub mod error;
pub mod prelude;
pub mod sink;
pub mod spec;

mod priv_util;

pub use base::DevTree;
pub use error::{DevTreeError, Result};
