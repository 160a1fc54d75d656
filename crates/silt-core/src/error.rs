//! Error types shared across the Silt workspace.

use std::error::Error;
use std::fmt;

/// Errors from channel-set construction and extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChannelError {
    /// A channel with this name is already registered.
    Duplicate {
        /// The conflicting name.
        name: String,
    },
    /// Channels must carry at least one scalar lane.
    ZeroArity {
        /// The offending channel name.
        name: String,
    },
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate { name } => write!(f, "channel '{name}' is already registered"),
            Self::ZeroArity { name } => write!(f, "channel '{name}' declares zero lanes"),
        }
    }
}

impl Error for ChannelError {}
