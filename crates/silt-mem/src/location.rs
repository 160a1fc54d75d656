//! Memory spaces and locations.

use std::fmt;

/// Which address space a buffer lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemorySpace {
    /// Ordinary host heap memory.
    Host,
    /// Discrete accelerator memory; requires a compiled device backend.
    Device,
    /// Memory addressable from both host and device.
    Unified,
}

impl fmt::Display for MemorySpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::Device => write!(f, "device"),
            Self::Unified => write!(f, "unified"),
        }
    }
}

/// A memory space plus a device ordinal.
///
/// The ordinal is `-1` for host-side locations, matching the usual
/// "processor id" convention for CPU residency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MemoryLocation {
    /// Address space.
    pub space: MemorySpace,
    /// Device ordinal; `-1` when the space is host-resident.
    pub device: i32,
}

impl MemoryLocation {
    /// Host heap location.
    pub const fn host() -> Self {
        Self {
            space: MemorySpace::Host,
            device: -1,
        }
    }

    /// Unified (host+device addressable) location on the given device.
    pub const fn unified(device: i32) -> Self {
        Self {
            space: MemorySpace::Unified,
            device,
        }
    }

    /// Discrete device location on the given device.
    pub const fn device(device: i32) -> Self {
        Self {
            space: MemorySpace::Device,
            device,
        }
    }

    /// Whether this location is directly addressable from the host.
    pub const fn host_accessible(&self) -> bool {
        matches!(self.space, MemorySpace::Host | MemorySpace::Unified)
    }
}

impl Default for MemoryLocation {
    fn default() -> Self {
        Self::host()
    }
}

impl fmt::Display for MemoryLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.space, self.device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_is_accessible_and_unnumbered() {
        let loc = MemoryLocation::host();
        assert!(loc.host_accessible());
        assert_eq!(loc.device, -1);
    }

    #[test]
    fn device_is_not_host_accessible() {
        assert!(!MemoryLocation::device(0).host_accessible());
        assert!(MemoryLocation::unified(0).host_accessible());
    }
}
