//! Data-parallel execution policies for the Silt storage engine.
//!
//! An [`ExecutionPolicy`] is a stateless configuration object — a
//! backend tag plus a degree of parallelism — passed per call and never
//! owned by a data structure. It provides the primitives everything
//! above it is written against:
//!
//! - [`for_each`](ExecutionPolicy::for_each): one body invocation per
//!   index, **no ordering guarantee** between indices;
//! - [`inclusive_scan`](ExecutionPolicy::inclusive_scan) /
//!   [`exclusive_scan`](ExecutionPolicy::exclusive_scan) /
//!   [`reduce`](ExecutionPolicy::reduce): two-phase parallel algorithms
//!   over an associative operator with an identity element;
//! - [`radix_sort_pairs`](ExecutionPolicy::radix_sort_pairs): stable
//!   key-value partition over a fixed bit range;
//! - [`sync`](ExecutionPolicy::sync): the explicit completion fence.
//!
//! Backends form a closed set ([`Backend`]); the GPU grid backend is
//! rejected at construction until device support is compiled in.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod backend;
pub mod error;
pub mod policy;
mod scan;
mod sort;

pub use backend::Backend;
pub use error::ExecError;
pub use policy::ExecutionPolicy;
