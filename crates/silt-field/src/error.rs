//! Field-layer error types.

use silt_grid::GridError;
use silt_mem::MemError;
use silt_table::TableError;
use std::error::Error;
use std::fmt;

/// Errors from sparse level set construction and maintenance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldError {
    /// The hash table rejected an operation.
    Table(TableError),
    /// The block grid rejected an operation.
    Grid(GridError),
    /// Memory allocation or residency failed.
    Memory(MemError),
    /// An operation requires a channel that is not registered.
    ///
    /// Raised before the operation mutates anything; a flood fill
    /// without its mask channel aborts here rather than tolerating the
    /// missing input.
    MissingChannel {
        /// The required channel name.
        name: String,
    },
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table(e) => write!(f, "{e}"),
            Self::Grid(e) => write!(f, "{e}"),
            Self::Memory(e) => write!(f, "{e}"),
            Self::MissingChannel { name } => {
                write!(f, "required channel '{name}' is not registered")
            }
        }
    }
}

impl Error for FieldError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Table(e) => Some(e),
            Self::Grid(e) => Some(e),
            Self::Memory(e) => Some(e),
            Self::MissingChannel { .. } => None,
        }
    }
}

impl From<TableError> for FieldError {
    fn from(e: TableError) -> Self {
        Self::Table(e)
    }
}

impl From<GridError> for FieldError {
    fn from(e: GridError) -> Self {
        Self::Grid(e)
    }
}

impl From<MemError> for FieldError {
    fn from(e: MemError) -> Self {
        Self::Memory(e)
    }
}
