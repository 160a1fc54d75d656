//! The owning [`Slab`] buffer and explicit transfers.

use crate::error::MemError;
use crate::location::{MemoryLocation, MemorySpace};
use crate::resource::MemoryResource;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// A fixed-length run of 32-bit cells owned by one memory resource.
///
/// Cells are atomics so that data-parallel workers may write through a
/// shared reference; relaxed loads and stores compile to plain moves on
/// every supported target, so single-writer phases pay nothing for it.
/// Scalar views bit-cast between `u32` and `f32`.
pub struct Slab {
    cells: Box<[AtomicU32]>,
    location: MemoryLocation,
    resource: Arc<dyn MemoryResource>,
}

impl Slab {
    /// Allocate a zero-initialised slab from a resource.
    pub fn allocate(resource: Arc<dyn MemoryResource>, cells: usize) -> Result<Self, MemError> {
        let buf = resource.allocate(cells)?;
        Ok(Self {
            cells: buf,
            location: resource.location(),
            resource,
        })
    }

    /// Number of 32-bit cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` for a zero-length slab.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Where this slab lives.
    pub fn location(&self) -> MemoryLocation {
        self.location
    }

    /// The resource that owns this slab's backing memory.
    pub fn resource(&self) -> &Arc<dyn MemoryResource> {
        &self.resource
    }

    /// Read a cell as `f32`.
    #[inline]
    pub fn get_f32(&self, index: usize) -> f32 {
        f32::from_bits(self.cells[index].load(Ordering::Relaxed))
    }

    /// Write a cell as `f32`.
    #[inline]
    pub fn set_f32(&self, index: usize, value: f32) {
        self.cells[index].store(value.to_bits(), Ordering::Relaxed);
    }

    /// Read a cell as `u32`.
    #[inline]
    pub fn get_u32(&self, index: usize) -> u32 {
        self.cells[index].load(Ordering::Relaxed)
    }

    /// Write a cell as `u32`.
    #[inline]
    pub fn set_u32(&self, index: usize, value: u32) {
        self.cells[index].store(value, Ordering::Relaxed);
    }

    /// Atomically add `value` to a cell interpreted as `f32`.
    ///
    /// Compare-exchange loop; safe against any number of concurrent
    /// depositors. Returns the previous value.
    #[inline]
    pub fn atomic_add_f32(&self, index: usize, value: f32) -> f32 {
        let cell = &self.cells[index];
        let mut current = cell.load(Ordering::Relaxed);
        loop {
            let next = (f32::from_bits(current) + value).to_bits();
            match cell.compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Relaxed) {
                Ok(_) => return f32::from_bits(current),
                Err(actual) => current = actual,
            }
        }
    }

    /// Atomically raise a cell interpreted as `f32` to at least `value`.
    ///
    /// Returns the previous value.
    #[inline]
    pub fn atomic_max_f32(&self, index: usize, value: f32) -> f32 {
        let cell = &self.cells[index];
        let mut current = cell.load(Ordering::Relaxed);
        loop {
            if f32::from_bits(current) >= value {
                return f32::from_bits(current);
            }
            match cell.compare_exchange_weak(
                current,
                value.to_bits(),
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return f32::from_bits(current),
                Err(actual) => current = actual,
            }
        }
    }

    /// Zero a range of cells.
    pub fn fill_zero(&self, start: usize, end: usize) {
        for cell in &self.cells[start..end] {
            cell.store(0, Ordering::Relaxed);
        }
    }
}

impl std::fmt::Debug for Slab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slab")
            .field("cells", &self.cells.len())
            .field("location", &self.location)
            .finish()
    }
}

/// Whether a copy path exists between two memory spaces.
///
/// Host and unified memory are mutually reachable. Discrete device
/// memory has no route in this build; a compiled device backend would
/// widen this table.
pub fn transfer_supported(src: MemorySpace, dst: MemorySpace) -> bool {
    !matches!(src, MemorySpace::Device) && !matches!(dst, MemorySpace::Device)
}

/// Copy `cells` cells from the front of `src` to the front of `dst`.
///
/// The only way data moves between two slabs. Fails with
/// [`MemError::UnsupportedTransfer`] when no route exists between the
/// two spaces and [`MemError::LengthMismatch`] when either slab is
/// shorter than the requested count. Callers sequence transfers against
/// parallel phases themselves; the copy is not a synchronisation point.
pub fn transfer(src: &Slab, dst: &Slab, cells: usize) -> Result<(), MemError> {
    if !transfer_supported(src.location().space, dst.location().space) {
        return Err(MemError::UnsupportedTransfer {
            src: src.location().space,
            dst: dst.location().space,
        });
    }
    let available = src.len().min(dst.len());
    if cells > available {
        return Err(MemError::LengthMismatch { cells, available });
    }
    for i in 0..cells {
        dst.set_u32(i, src.get_u32(i));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{HostResource, UnifiedResource};

    fn host_slab(cells: usize) -> Slab {
        Slab::allocate(Arc::new(HostResource::new()), cells).unwrap()
    }

    #[test]
    fn allocation_is_zeroed_and_located() {
        let slab = host_slab(16);
        assert_eq!(slab.len(), 16);
        assert_eq!(slab.location(), MemoryLocation::host());
        assert!((0..16).all(|i| slab.get_f32(i) == 0.0));
    }

    #[test]
    fn f32_roundtrip_including_negative_zero() {
        let slab = host_slab(4);
        slab.set_f32(1, -0.0);
        slab.set_f32(2, 3.25);
        assert_eq!(slab.get_f32(1).to_bits(), (-0.0f32).to_bits());
        assert_eq!(slab.get_f32(2), 3.25);
    }

    #[test]
    fn atomic_add_accumulates_across_threads() {
        let slab = host_slab(1);
        let threads = 8;
        let per_thread = 1000;
        std::thread::scope(|scope| {
            for _ in 0..threads {
                scope.spawn(|| {
                    for _ in 0..per_thread {
                        slab.atomic_add_f32(0, 1.0);
                    }
                });
            }
        });
        assert_eq!(slab.get_f32(0), (threads * per_thread) as f32);
    }

    #[test]
    fn atomic_max_keeps_largest() {
        let slab = host_slab(1);
        slab.set_f32(0, 2.0);
        slab.atomic_max_f32(0, 1.0);
        assert_eq!(slab.get_f32(0), 2.0);
        slab.atomic_max_f32(0, 5.0);
        assert_eq!(slab.get_f32(0), 5.0);
    }

    #[test]
    fn host_to_unified_transfer_copies() {
        let src = host_slab(8);
        let dst = Slab::allocate(Arc::new(UnifiedResource::new(0)), 8).unwrap();
        for i in 0..8 {
            src.set_f32(i, i as f32);
        }
        transfer(&src, &dst, 8).unwrap();
        assert!((0..8).all(|i| dst.get_f32(i) == i as f32));
    }

    #[test]
    fn device_routes_are_closed_without_a_backend() {
        use crate::location::MemorySpace::{Device, Host, Unified};
        assert!(transfer_supported(Host, Host));
        assert!(transfer_supported(Host, Unified));
        assert!(transfer_supported(Unified, Host));
        assert!(!transfer_supported(Host, Device));
        assert!(!transfer_supported(Device, Host));
        assert!(!transfer_supported(Device, Unified));
    }

    #[test]
    fn oversized_transfer_is_rejected() {
        let src = host_slab(4);
        let dst = host_slab(2);
        let err = transfer(&src, &dst, 4).unwrap_err();
        assert_eq!(
            err,
            MemError::LengthMismatch {
                cells: 4,
                available: 2
            }
        );
    }
}
