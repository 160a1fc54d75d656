//! Grid error types.

use silt_core::ChannelError;
use silt_mem::MemError;
use std::error::Error;
use std::fmt;

/// Errors from grid construction, resizing, and channel extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GridError {
    /// A channel registration was invalid.
    Channel(ChannelError),
    /// The backing slab could not be allocated or moved.
    Memory(MemError),
    /// Blocks must span at least one cell per axis.
    ZeroSideLength,
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel(e) => write!(f, "channel registration failed: {e}"),
            Self::Memory(e) => write!(f, "grid storage operation failed: {e}"),
            Self::ZeroSideLength => write!(f, "block side length must be at least 1"),
        }
    }
}

impl Error for GridError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Channel(e) => Some(e),
            Self::Memory(e) => Some(e),
            Self::ZeroSideLength => None,
        }
    }
}

impl From<ChannelError> for GridError {
    fn from(e: ChannelError) -> Self {
        Self::Channel(e)
    }
}

impl From<MemError> for GridError {
    fn from(e: MemError) -> Self {
        Self::Memory(e)
    }
}
