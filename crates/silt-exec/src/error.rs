//! Execution backend error types.

use crate::backend::Backend;
use std::error::Error;
use std::fmt;

/// Errors from execution-policy construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecError {
    /// The requested backend is not compiled into this build.
    BackendUnavailable {
        /// The backend that was requested.
        backend: Backend,
    },
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BackendUnavailable { backend } => {
                write!(f, "{backend} backend is not compiled into this build")
            }
        }
    }
}

impl Error for ExecError {}
