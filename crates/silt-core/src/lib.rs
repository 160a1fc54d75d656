//! Core types for the Silt sparse spatial storage engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions shared across the Silt workspace:
//! packed block-coordinate keys, channel descriptors and the ordered
//! channel set, and neighborhood stencil enumeration.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod channel;
pub mod error;
pub mod key;
pub mod stencil;

pub use channel::{Channel, ChannelSet, ChannelTag};
pub use error::ChannelError;
pub use key::{hash_key, pack_key, unpack_key, BlockIndex, PackedKey, EMPTY_KEY, NIL_INDEX};
pub use stencil::{chebyshev, fan_out, moore_offsets};
