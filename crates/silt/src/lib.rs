//! Silt: a sparse spatial storage engine for particle/grid simulation.
//!
//! This is the top-level facade crate that re-exports the public API
//! from all Silt sub-crates. For most users, adding `silt` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use silt::prelude::*;
//!
//! // A 3D sparse field with 4^3-cell blocks and two channels.
//! let mut set = SparseLevelSet::<3>::builder()
//!     .side_length(4)
//!     .capacity(64)
//!     .channel("mass", 1)
//!     .channel("vel", 3)
//!     .dx(0.1)
//!     .build()
//!     .unwrap();
//!
//! // Activate a block, then grow the domain by one neighbor layer.
//! set.insert_block([0, 0, 0]).unwrap();
//! let policy = ExecutionPolicy::multi_threaded();
//! set.extend_domain(&policy, 1).unwrap();
//! assert_eq!(set.active_blocks(), 27);
//!
//! // Deposit into a cell the way a transfer kernel would.
//! let mass = set.grid().channel_offset("mass").unwrap();
//! policy.for_each(0..100, |_| {
//!     set.deposit_at(mass, [1, 2, 3], 1.0);
//! });
//! policy.sync();
//! assert_eq!(set.value_at(mass, [1, 2, 3]), Some(100.0));
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in
//! the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `silt-core` | packed keys, channel descriptors, stencils |
//! | [`mem`] | `silt-mem` | memory spaces, resources, slabs, transfers |
//! | [`exec`] | `silt-exec` | execution policies: for-each, scan, reduce, sort |
//! | [`table`] | `silt-table` | the concurrent block-coordinate hash table |
//! | [`grid`] | `silt-grid` | block-structured channel storage |
//! | [`field`] | `silt-field` | sparse level sets and domain maintenance |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Packed keys, channel descriptors, and stencils (`silt-core`).
pub use silt_core as types;

/// Memory spaces, resources, and slabs (`silt-mem`).
///
/// Contains [`mem::MemorySpace`], [`mem::MemoryLocation`], the
/// [`mem::MemoryResource`] trait, and the explicit [`mem::transfer`]
/// operation between locations.
pub use silt_mem as mem;

/// Execution policies and parallel primitives (`silt-exec`).
///
/// The [`exec::ExecutionPolicy`] strategy object dispatches over the
/// closed backend set and provides `for_each`, scans, reduce, and the
/// stable radix sort.
pub use silt_exec as exec;

/// The concurrent block-coordinate hash table (`silt-table`).
pub use silt_table as table;

/// Block-structured channel storage (`silt-grid`).
pub use silt_grid as grid;

/// Sparse level sets and domain maintenance (`silt-field`).
///
/// [`field::SparseLevelSet`] composes the table and grid, and carries
/// `extend_domain`, `refit_domain`, and `flood_fill`.
pub use silt_field as field;

/// Common imports for typical Silt usage.
///
/// ```rust
/// use silt::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use silt_core::{ChannelSet, ChannelTag};

    // Memory
    pub use silt_mem::{MemoryLocation, MemorySpace};

    // Execution
    pub use silt_exec::{Backend, ExecutionPolicy};

    // Storage
    pub use silt_grid::{BlockLayout, BlockRef, Grid};
    pub use silt_table::HashTable;

    // Sparse fields
    pub use silt_field::{
        FloodFillOutcome, SparseLevelSet, SparseLevelSetBuilder, MASK_CHANNEL, TAG_CHANNEL,
    };

    // Errors
    pub use silt_core::ChannelError;
    pub use silt_exec::ExecError;
    pub use silt_field::FieldError;
    pub use silt_grid::GridError;
    pub use silt_mem::MemError;
    pub use silt_table::TableError;
}
