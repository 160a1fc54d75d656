//! The closed set of execution backends.

use std::fmt;

/// Which engine executes a policy's parallel primitives.
///
/// A closed set: adding a backend is an API change, not a plugin
/// registration. All backends implement the same completion contract —
/// work submitted by one call is observable only after
/// [`sync`](crate::ExecutionPolicy::sync) (the CPU backends happen to
/// complete synchronously, which satisfies the contract trivially).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Single-threaded reference backend; deterministic iteration order.
    Sequential,
    /// CPU worker-pool backend; indices run in unspecified order.
    MultiThreaded,
    /// Massively parallel device-grid backend.
    ///
    /// Present in the set so callers can be written against it, but
    /// construction fails until a device backend is compiled in.
    GpuGrid,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::MultiThreaded => write!(f, "multi-threaded"),
            Self::GpuGrid => write!(f, "gpu-grid"),
        }
    }
}
