//! Concurrent block-coordinate hash table.
//!
//! Maps `D`-dimensional integer block coordinates to dense block
//! indices. Any number of workers may [`insert`](HashTable::insert) and
//! [`query`](HashTable::query) concurrently; a key inserted from many
//! workers at once yields exactly one surviving index, and the dense
//! active-key array never holds duplicates. Everything else — `reset`,
//! `resize` — takes `&mut self` and therefore cannot overlap probes.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod table;

pub use error::TableError;
pub use table::HashTable;
