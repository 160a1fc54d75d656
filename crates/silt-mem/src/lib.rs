//! Memory abstraction for the Silt sparse spatial storage engine.
//!
//! Containers own their storage through a [`Slab`]: a fixed-length run
//! of 32-bit cells allocated by a polymorphic [`MemoryResource`] and
//! tagged with a [`MemoryLocation`]. Cells are atomics so data-parallel
//! workers can deposit through shared references; scalar access
//! bit-casts to and from `f32`.
//!
//! Moves between two locations are never implicit: [`transfer`] is the
//! only path, and it fails with [`MemError::UnsupportedTransfer`] when
//! no route exists between the two spaces.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod location;
pub mod resource;
pub mod slab;

pub use error::MemError;
pub use location::{MemoryLocation, MemorySpace};
pub use resource::{DeviceResource, HostResource, MemoryResource, UnifiedResource};
pub use slab::{transfer, transfer_supported, Slab};
