//! The [`SparseLevelSet`] container and its builder.

use crate::error::FieldError;
use silt_core::{BlockIndex, ChannelTag};
use silt_grid::{BlockLayout, BlockRef, Grid};
use silt_mem::{DeviceResource, HostResource, MemoryResource, MemorySpace, UnifiedResource};
use silt_table::HashTable;
use std::sync::Arc;

/// Channel marking which cells participate in a flood fill.
pub const MASK_CHANNEL: &str = "mask";

/// Working channel: nonzero once a cell's value is known.
pub const TAG_CHANNEL: &str = "tag";

/// Working channel: marks this iteration's seed candidates.
pub const TAG_MASK_CHANNEL: &str = "tagmask";

/// A block-sparse scalar field: hash table, channel grid, and cell
/// spacing, created and destroyed as a unit.
///
/// The table maps block coordinates to dense indices; the grid holds
/// the channel data for exactly those indices. `grid.block_count()`
/// always equals the table's key capacity, so every index the table
/// can assign has backing storage.
pub struct SparseLevelSet<const D: usize> {
    pub(crate) table: HashTable<D>,
    pub(crate) grid: Grid<D>,
    dx: f32,
}

impl<const D: usize> SparseLevelSet<D> {
    /// Start building a level set.
    pub fn builder() -> SparseLevelSetBuilder<D> {
        SparseLevelSetBuilder::new()
    }

    /// The coordinate-to-index table.
    pub fn table(&self) -> &HashTable<D> {
        &self.table
    }

    /// The block channel storage.
    pub fn grid(&self) -> &Grid<D> {
        &self.grid
    }

    /// Cell spacing.
    pub fn dx(&self) -> f32 {
        self.dx
    }

    /// Number of active blocks.
    pub fn active_blocks(&self) -> u32 {
        self.table.len()
    }

    /// Current block capacity.
    pub fn capacity(&self) -> u32 {
        self.table.capacity()
    }

    /// Allocate (or find) the block at a coordinate.
    ///
    /// Concurrency-safe; fresh blocks come up zeroed because grid
    /// storage beyond the active prefix is always zero.
    pub fn insert_block(&self, coord: [i32; D]) -> Result<BlockIndex, FieldError> {
        Ok(self.table.insert(coord)?)
    }

    /// Look up the block at a coordinate.
    pub fn query_block(&self, coord: [i32; D]) -> Option<BlockIndex> {
        self.table.query(coord)
    }

    /// Borrow an active block by index.
    pub fn block(&self, index: BlockIndex) -> BlockRef<'_, D> {
        self.grid.block(index)
    }

    /// Read one scalar lane at a global cell coordinate.
    ///
    /// `None` when the covering block is not active.
    pub fn value_at(&self, lane: u32, global: [i32; D]) -> Option<f32> {
        let (block, cell) = self.grid.layout().global_cell(global);
        let index = self.table.query(block)?;
        Some(self.grid.cell(lane, index, cell))
    }

    /// Write one scalar lane at a global cell coordinate.
    ///
    /// Returns `false` (without writing) when the covering block is not
    /// active; use [`insert_block`](Self::insert_block) first to
    /// allocate it.
    pub fn set_value_at(&self, lane: u32, global: [i32; D], value: f32) -> bool {
        let (block, cell) = self.grid.layout().global_cell(global);
        match self.table.query(block) {
            Some(index) => {
                self.grid.set_cell(lane, index, cell, value);
                true
            }
            None => false,
        }
    }

    /// Atomically accumulate onto one scalar lane at a global cell
    /// coordinate.
    ///
    /// Returns `false` when the covering block is not active.
    pub fn deposit_at(&self, lane: u32, global: [i32; D], value: f32) -> bool {
        let (block, cell) = self.grid.layout().global_cell(global);
        match self.table.query(block) {
            Some(index) => {
                self.grid.deposit(lane, index, cell, value);
                true
            }
            None => false,
        }
    }

    /// Extend the channel set, migrating all existing block data.
    pub fn append_channels(&mut self, tags: &[ChannelTag]) -> Result<(), FieldError> {
        Ok(self.grid.append_channels(tags)?)
    }

    /// Grow (or shrink, down to the active count) the block capacity.
    ///
    /// Table and grid resize together so indices stay backed. The old
    /// generation's buffers remain readable until each swap completes.
    pub fn resize(&mut self, new_capacity: u32) -> Result<(), FieldError> {
        self.table.resize(new_capacity)?;
        self.grid.resize(new_capacity)?;
        Ok(())
    }
}

impl<const D: usize> std::fmt::Debug for SparseLevelSet<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SparseLevelSet")
            .field("dim", &D)
            .field("active", &self.active_blocks())
            .field("capacity", &self.capacity())
            .field("dx", &self.dx)
            .finish()
    }
}

/// Builder for [`SparseLevelSet`].
///
/// Collects memory space, device ordinal, side length, capacity,
/// channel declarations, and cell spacing, then allocates everything
/// in one step.
#[derive(Clone, Debug)]
pub struct SparseLevelSetBuilder<const D: usize> {
    space: MemorySpace,
    device: i32,
    side_length: u32,
    capacity: u32,
    channels: Vec<ChannelTag>,
    dx: f32,
}

impl<const D: usize> SparseLevelSetBuilder<D> {
    /// Defaults: host memory, side length 4, capacity 1024, dx 1.0, no
    /// channels.
    pub fn new() -> Self {
        Self {
            space: MemorySpace::Host,
            device: -1,
            side_length: 4,
            capacity: 1024,
            channels: Vec::new(),
            dx: 1.0,
        }
    }

    /// Select the memory space and device ordinal.
    pub fn memory(mut self, space: MemorySpace, device: i32) -> Self {
        self.space = space;
        self.device = device;
        self
    }

    /// Cells per block axis.
    pub fn side_length(mut self, side_length: u32) -> Self {
        self.side_length = side_length;
        self
    }

    /// Initial block capacity.
    pub fn capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    /// Cell spacing.
    pub fn dx(mut self, dx: f32) -> Self {
        self.dx = dx;
        self
    }

    /// Declare one channel.
    pub fn channel(mut self, name: impl Into<String>, arity: u32) -> Self {
        self.channels.push(ChannelTag::new(name, arity));
        self
    }

    /// Declare a list of channels, in order.
    pub fn channels(mut self, tags: &[ChannelTag]) -> Self {
        self.channels.extend(tags.iter().cloned());
        self
    }

    /// Allocate the level set.
    pub fn build(self) -> Result<SparseLevelSet<D>, FieldError> {
        let resource: Arc<dyn MemoryResource> = match self.space {
            MemorySpace::Host => Arc::new(HostResource::new()),
            MemorySpace::Unified => Arc::new(UnifiedResource::new(self.device)),
            MemorySpace::Device => Arc::new(DeviceResource::new(self.device)?),
        };
        let table = HashTable::with_capacity(self.capacity)?;
        let layout = BlockLayout::new(self.side_length)?;
        let grid = Grid::new(resource, layout, &self.channels, self.capacity)?;
        Ok(SparseLevelSet {
            table,
            grid,
            dx: self.dx,
        })
    }
}

impl<const D: usize> Default for SparseLevelSetBuilder<D> {
    fn default() -> Self {
        Self::new()
    }
}
