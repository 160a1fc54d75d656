//! The [`Grid`] slab and its block views.

use crate::error::GridError;
use crate::layout::BlockLayout;
use silt_core::{ChannelSet, ChannelTag};
use silt_mem::{MemoryResource, Slab};
use std::sync::Arc;

/// Dense array of per-block channel slabs.
///
/// Storage is one contiguous slab of
/// `block_count * total_arity * cells_per_block` scalars. Within a
/// block the layout is structure-of-arrays: each scalar lane is
/// contiguous across the block's cells, so
/// `lane_index = (block * total_arity + lane) * cells_per_block + cell`.
///
/// A block index has no meaning unless a hash table insert produced it;
/// the hot accessors do not re-check that contract.
pub struct Grid<const D: usize> {
    slab: Slab,
    layout: BlockLayout<D>,
    channels: ChannelSet,
    block_count: u32,
}

impl<const D: usize> Grid<D> {
    /// Allocate a grid of `block_count` zeroed blocks.
    pub fn new(
        resource: Arc<dyn MemoryResource>,
        layout: BlockLayout<D>,
        tags: &[ChannelTag],
        block_count: u32,
    ) -> Result<Self, GridError> {
        let channels = ChannelSet::from_tags(tags)?;
        let cells = block_count as usize
            * channels.total_arity() as usize
            * layout.cells_per_block() as usize;
        let slab = Slab::allocate(resource, cells)?;
        Ok(Self {
            slab,
            layout,
            channels,
            block_count,
        })
    }

    /// Number of allocated blocks.
    pub fn block_count(&self) -> u32 {
        self.block_count
    }

    /// The block geometry.
    pub fn layout(&self) -> &BlockLayout<D> {
        &self.layout
    }

    /// The registered channel set.
    pub fn channels(&self) -> &ChannelSet {
        &self.channels
    }

    /// First scalar lane of the named channel, if registered.
    pub fn channel_offset(&self, name: &str) -> Option<u32> {
        self.channels.offset(name)
    }

    /// Whether the named channel is registered.
    pub fn has_channel(&self, name: &str) -> bool {
        self.channels.contains(name)
    }

    /// The resource that owns this grid's backing slab.
    ///
    /// Clone-then-rebuild patterns allocate the next generation from
    /// the same resource before the old slab is released.
    pub fn resource(&self) -> &Arc<dyn MemoryResource> {
        self.slab.resource()
    }

    /// Scalars per block across all channels.
    pub fn block_stride(&self) -> usize {
        self.channels.total_arity() as usize * self.layout.cells_per_block() as usize
    }

    #[inline]
    fn index(&self, lane: u32, block: u32, cell: u32) -> usize {
        debug_assert!(lane < self.channels.total_arity());
        debug_assert!(block < self.block_count);
        debug_assert!(cell < self.layout.cells_per_block());
        (block as usize * self.channels.total_arity() as usize + lane as usize)
            * self.layout.cells_per_block() as usize
            + cell as usize
    }

    /// Read one scalar lane of one cell.
    #[inline]
    pub fn cell(&self, lane: u32, block: u32, cell: u32) -> f32 {
        self.slab.get_f32(self.index(lane, block, cell))
    }

    /// Write one scalar lane of one cell.
    ///
    /// Plain store; for cross-worker accumulation use
    /// [`deposit`](Self::deposit) instead.
    #[inline]
    pub fn set_cell(&self, lane: u32, block: u32, cell: u32, value: f32) {
        self.slab.set_f32(self.index(lane, block, cell), value);
    }

    /// Read one scalar lane at a block-local coordinate.
    #[inline]
    pub fn cell_at(&self, lane: u32, block: u32, local: [u32; D]) -> f32 {
        self.cell(lane, block, self.layout.cell_id(local))
    }

    /// Write one scalar lane at a block-local coordinate.
    #[inline]
    pub fn set_cell_at(&self, lane: u32, block: u32, local: [u32; D], value: f32) {
        self.set_cell(lane, block, self.layout.cell_id(local), value);
    }

    /// Atomically add `value` onto a cell lane.
    ///
    /// The deposit path for per-cell accumulation channels receiving
    /// contributions from many workers: N concurrent deposits of `v`
    /// sum to exactly `N * v` regardless of scheduling.
    #[inline]
    pub fn deposit(&self, lane: u32, block: u32, cell: u32, value: f32) {
        self.slab.atomic_add_f32(self.index(lane, block, cell), value);
    }

    /// Atomically raise a cell lane to at least `value`.
    #[inline]
    pub fn deposit_max(&self, lane: u32, block: u32, cell: u32, value: f32) {
        self.slab.atomic_max_f32(self.index(lane, block, cell), value);
    }

    /// Borrow one block as a handle.
    pub fn block(&self, block: u32) -> BlockRef<'_, D> {
        debug_assert!(block < self.block_count);
        BlockRef { grid: self, block }
    }

    /// Zero every channel of one block.
    pub fn zero_block(&self, block: u32) {
        let stride = self.block_stride();
        let start = block as usize * stride;
        self.slab.fill_zero(start, start + stride);
    }

    /// Reallocate to hold `new_block_count` blocks.
    ///
    /// Contents within the old bounds are preserved by copy; blocks
    /// beyond them come up zeroed. The old slab stays readable until
    /// the swap, then its resource releases it.
    pub fn resize(&mut self, new_block_count: u32) -> Result<(), GridError> {
        if new_block_count == self.block_count {
            return Ok(());
        }
        let stride = self.block_stride();
        let slab = Slab::allocate(
            Arc::clone(self.slab.resource()),
            new_block_count as usize * stride,
        )?;
        let keep = self.block_count.min(new_block_count) as usize * stride;
        for i in 0..keep {
            slab.set_u32(i, self.slab.get_u32(i));
        }
        self.slab = slab;
        self.block_count = new_block_count;
        Ok(())
    }

    /// Extend the channel set, migrating all existing data.
    ///
    /// Allocates a slab sized for the widened arity, copies every
    /// existing channel's lanes into their (unchanged) offsets, then
    /// swaps the slab and the channel registry together. Not safe
    /// concurrently with readers — exclusive access is the caller's
    /// synchronisation point.
    pub fn append_channels(&mut self, tags: &[ChannelTag]) -> Result<(), GridError> {
        let mut widened = self.channels.clone();
        for tag in tags {
            widened.push(tag.clone())?;
        }
        let cells_per_block = self.layout.cells_per_block() as usize;
        let old_arity = self.channels.total_arity() as usize;
        let new_arity = widened.total_arity() as usize;
        let slab = Slab::allocate(
            Arc::clone(self.slab.resource()),
            self.block_count as usize * new_arity * cells_per_block,
        )?;
        for block in 0..self.block_count as usize {
            for lane in 0..old_arity {
                let src = (block * old_arity + lane) * cells_per_block;
                let dst = (block * new_arity + lane) * cells_per_block;
                for cell in 0..cells_per_block {
                    slab.set_u32(dst + cell, self.slab.get_u32(src + cell));
                }
            }
        }
        self.slab = slab;
        self.channels = widened;
        Ok(())
    }

    /// Copy every channel of `src_block` in `src` into `dst_block`.
    ///
    /// The two grids must share layout and channel arity; domain
    /// compaction uses this to move survivors into a fresh generation.
    pub fn copy_block_from(&self, src: &Grid<D>, src_block: u32, dst_block: u32) {
        debug_assert_eq!(self.block_stride(), src.block_stride());
        let stride = self.block_stride();
        let from = src_block as usize * stride;
        let to = dst_block as usize * stride;
        for i in 0..stride {
            self.slab.set_u32(to + i, src.slab.get_u32(from + i));
        }
    }
}

impl<const D: usize> std::fmt::Debug for Grid<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grid")
            .field("dim", &D)
            .field("blocks", &self.block_count)
            .field("side", &self.layout.side_length())
            .field("lanes", &self.channels.total_arity())
            .finish()
    }
}

/// Borrowed view of one block.
#[derive(Clone, Copy)]
pub struct BlockRef<'a, const D: usize> {
    grid: &'a Grid<D>,
    block: u32,
}

impl<const D: usize> BlockRef<'_, D> {
    /// This block's dense index.
    pub fn index(&self) -> u32 {
        self.block
    }

    /// Read one scalar lane of one cell.
    #[inline]
    pub fn cell(&self, lane: u32, cell: u32) -> f32 {
        self.grid.cell(lane, self.block, cell)
    }

    /// Write one scalar lane of one cell.
    #[inline]
    pub fn set_cell(&self, lane: u32, cell: u32, value: f32) {
        self.grid.set_cell(lane, self.block, cell, value);
    }

    /// Read one scalar lane at a block-local coordinate.
    #[inline]
    pub fn cell_at(&self, lane: u32, local: [u32; D]) -> f32 {
        self.grid.cell_at(lane, self.block, local)
    }

    /// Write one scalar lane at a block-local coordinate.
    #[inline]
    pub fn set_cell_at(&self, lane: u32, local: [u32; D], value: f32) {
        self.grid.set_cell_at(lane, self.block, local, value);
    }

    /// Atomically add onto a cell lane.
    #[inline]
    pub fn deposit(&self, lane: u32, cell: u32, value: f32) {
        self.grid.deposit(lane, self.block, cell, value);
    }
}
