//! Memory subsystem error types.

use crate::location::MemorySpace;
use std::error::Error;
use std::fmt;

/// Errors from allocation and transfer operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemError {
    /// The backing allocator could not satisfy the request.
    OutOfMemory {
        /// Number of bytes requested.
        requested_bytes: usize,
    },
    /// No copy path exists between the two memory spaces.
    UnsupportedTransfer {
        /// Space of the source buffer.
        src: MemorySpace,
        /// Space of the destination buffer.
        dst: MemorySpace,
    },
    /// Source and destination must hold at least the copied cell count.
    LengthMismatch {
        /// Cells requested to copy.
        cells: usize,
        /// Cells available in the shorter buffer.
        available: usize,
    },
    /// Discrete device memory requires a compiled device backend.
    DeviceUnavailable {
        /// The requested device ordinal.
        device: i32,
    },
}

impl fmt::Display for MemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory { requested_bytes } => {
                write!(f, "allocation of {requested_bytes} bytes failed")
            }
            Self::UnsupportedTransfer { src, dst } => {
                write!(f, "no transfer path from {src} to {dst} memory")
            }
            Self::LengthMismatch { cells, available } => {
                write!(f, "transfer of {cells} cells exceeds buffer of {available}")
            }
            Self::DeviceUnavailable { device } => {
                write!(f, "device {device} unavailable: no device backend compiled in")
            }
        }
    }
}

impl Error for MemError {}
