//! Polymorphic memory resources.
//!
//! A [`MemoryResource`] produces zero-initialised cell runs for one
//! [`MemoryLocation`]. Every [`Slab`](crate::Slab) holds an `Arc` to
//! the resource that allocated it, so a resource outlives exactly the
//! buffers it produced and nothing else.

use crate::error::MemError;
use crate::location::MemoryLocation;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Counter for unique resource identity allocation.
static RESOURCE_COUNTER: AtomicU64 = AtomicU64::new(1);

fn next_resource_id() -> u64 {
    RESOURCE_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Allocation capability for one memory location.
///
/// Object-safe; containers store `Arc<dyn MemoryResource>`. Two
/// resources are interchangeable only if their
/// [`resource_id`](MemoryResource::resource_id)s match — identity, not
/// structural, equality, since a resource may own backing pools.
pub trait MemoryResource: Send + Sync {
    /// Allocate a zero-initialised run of 32-bit cells.
    fn allocate(&self, cells: usize) -> Result<Box<[AtomicU32]>, MemError>;

    /// The location all allocations from this resource live in.
    fn location(&self) -> MemoryLocation;

    /// Unique identity of this resource instance.
    fn resource_id(&self) -> u64;
}

/// Identity comparison between two resources.
pub fn resource_eq(a: &dyn MemoryResource, b: &dyn MemoryResource) -> bool {
    a.resource_id() == b.resource_id()
}

fn allocate_zeroed(cells: usize) -> Result<Box<[AtomicU32]>, MemError> {
    let mut buf: Vec<AtomicU32> = Vec::new();
    buf.try_reserve_exact(cells).map_err(|_| MemError::OutOfMemory {
        requested_bytes: cells * std::mem::size_of::<u32>(),
    })?;
    buf.resize_with(cells, || AtomicU32::new(0));
    Ok(buf.into_boxed_slice())
}

/// Host heap resource.
#[derive(Debug)]
pub struct HostResource {
    id: u64,
}

impl HostResource {
    /// Create a host heap resource.
    pub fn new() -> Self {
        Self {
            id: next_resource_id(),
        }
    }
}

impl Default for HostResource {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryResource for HostResource {
    fn allocate(&self, cells: usize) -> Result<Box<[AtomicU32]>, MemError> {
        allocate_zeroed(cells)
    }

    fn location(&self) -> MemoryLocation {
        MemoryLocation::host()
    }

    fn resource_id(&self) -> u64 {
        self.id
    }
}

/// Unified (host+device addressable) resource.
///
/// Without a device backend the backing store is the host heap; the
/// location tag still records the device ordinal so transfer routing
/// treats unified buffers as reachable from both sides.
#[derive(Debug)]
pub struct UnifiedResource {
    id: u64,
    device: i32,
}

impl UnifiedResource {
    /// Create a unified resource for the given device ordinal.
    pub fn new(device: i32) -> Self {
        Self {
            id: next_resource_id(),
            device,
        }
    }
}

impl MemoryResource for UnifiedResource {
    fn allocate(&self, cells: usize) -> Result<Box<[AtomicU32]>, MemError> {
        allocate_zeroed(cells)
    }

    fn location(&self) -> MemoryLocation {
        MemoryLocation::unified(self.device)
    }

    fn resource_id(&self) -> u64 {
        self.id
    }
}

/// Discrete device memory resource.
///
/// The closed backend set currently compiles without device support, so
/// construction reports that up front rather than deferring the failure
/// to the first allocation.
#[derive(Debug)]
pub struct DeviceResource {
    id: u64,
    device: i32,
}

impl DeviceResource {
    /// Attempt to open device memory on the given ordinal.
    ///
    /// Fails with [`MemError::DeviceUnavailable`] until a device
    /// backend is compiled in.
    pub fn new(device: i32) -> Result<Self, MemError> {
        Err(MemError::DeviceUnavailable { device })
    }

    /// Whether device memory support is compiled into this build.
    pub fn is_available() -> bool {
        false
    }
}

impl MemoryResource for DeviceResource {
    fn allocate(&self, _cells: usize) -> Result<Box<[AtomicU32]>, MemError> {
        Err(MemError::DeviceUnavailable {
            device: self.device,
        })
    }

    fn location(&self) -> MemoryLocation {
        MemoryLocation::device(self.device)
    }

    fn resource_id(&self) -> u64 {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_allocations_are_zeroed() {
        let res = HostResource::new();
        let buf = res.allocate(64).unwrap();
        assert_eq!(buf.len(), 64);
        assert!(buf.iter().all(|c| c.load(Ordering::Relaxed) == 0));
    }

    #[test]
    fn resources_have_distinct_identity() {
        let a = HostResource::new();
        let b = HostResource::new();
        assert!(!resource_eq(&a, &b));
        assert!(resource_eq(&a, &a));
    }

    #[test]
    fn device_resource_rejected_at_construction() {
        let err = DeviceResource::new(0).unwrap_err();
        assert_eq!(err, MemError::DeviceUnavailable { device: 0 });
        assert!(!DeviceResource::is_available());
    }

    #[test]
    fn unified_location_carries_device_ordinal() {
        let res = UnifiedResource::new(2);
        assert_eq!(res.location(), MemoryLocation::unified(2));
        assert!(res.location().host_accessible());
    }
}
