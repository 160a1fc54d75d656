//! Block-structured per-cell channel storage.
//!
//! A [`Grid`] is a dense array of fixed-size block slabs, index-aligned
//! 1:1 with the indices a hash table assigns, holding every registered
//! channel's scalar lanes in structure-of-arrays order within each
//! block. [`BlockLayout`] provides the exact-inverse mapping between
//! cell ids and block-local coordinates, with a bit-shift fast path
//! when the side length is a power of two.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod grid;
pub mod layout;

pub use error::GridError;
pub use grid::{BlockRef, Grid};
pub use layout::BlockLayout;
