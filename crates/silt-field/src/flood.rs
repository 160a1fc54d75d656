//! Flood-fill value propagation.

use crate::error::FieldError;
use crate::set::{SparseLevelSet, MASK_CHANNEL, TAG_CHANNEL, TAG_MASK_CHANNEL};
use silt_core::{moore_offsets, ChannelTag};
use silt_exec::ExecutionPolicy;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// What a completed flood fill did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FloodFillOutcome {
    /// Number of propagation iterations until the fixed point.
    pub iterations: u32,
    /// Active block count when the fill finished.
    pub blocks: u32,
}

impl<const D: usize> SparseLevelSet<D> {
    /// Propagate known cell values into adjacent unknown cells until no
    /// cell changes.
    ///
    /// A cell participates when its `"mask"` lane is nonzero; its value
    /// is known when its `"tag"` lane is nonzero. Each iteration finds
    /// every masked, untagged cell with a tagged Moore neighbor (26
    /// neighbors in 3D, across block boundaries), then assigns it the
    /// minimum tagged-neighbor value plus one cell spacing and tags it.
    /// The tagged frontier strictly expands while the masked domain is
    /// finite, so the loop reaches its fixed point in finitely many
    /// iterations.
    ///
    /// The `"mask"` channel and `value_channel` must already exist —
    /// a missing one aborts with [`FieldError::MissingChannel`] before
    /// anything is touched. The working `"tag"`/`"tagmask"` channels
    /// are appended (zeroed) if absent; callers seed the fill by
    /// setting `tag` and the value lane on the known cells. Boundary
    /// blocks whose frontier touches unallocated space trigger a
    /// one-layer extend on demand.
    pub fn flood_fill(
        &mut self,
        policy: &ExecutionPolicy,
        value_channel: &str,
    ) -> Result<FloodFillOutcome, FieldError> {
        let value = self.require_channel(value_channel)?;
        let mask = self.require_channel(MASK_CHANNEL)?;
        if !self.grid.has_channel(TAG_CHANNEL) {
            self.append_channels(&[ChannelTag::new(TAG_CHANNEL, 1)])?;
        }
        if !self.grid.has_channel(TAG_MASK_CHANNEL) {
            self.append_channels(&[ChannelTag::new(TAG_MASK_CHANNEL, 1)])?;
        }
        let tag = self.require_channel(TAG_CHANNEL)?;
        let tag_mask = self.require_channel(TAG_MASK_CHANNEL)?;

        let offsets = moore_offsets::<D>();
        let dx = self.dx();
        let mut iterations = 0u32;
        loop {
            if self.halo_demanded(policy, mask, tag) {
                self.extend_one_layer(policy)?;
            }

            let active = self.table.len();
            let cells = self.grid.layout().cells_per_block();
            let total = active as usize * cells as usize;
            let table = &self.table;
            let grid = &self.grid;
            let layout = *grid.layout();
            let offsets = &offsets;

            // Mark this iteration's seed candidates: masked, untagged,
            // and adjacent to an already-tagged cell.
            let seeds = AtomicU32::new(0);
            policy.for_each(0..total, |i| {
                let block = (i / cells as usize) as u32;
                let cell = (i % cells as usize) as u32;
                if grid.cell(mask, block, cell) == 0.0 || grid.cell(tag, block, cell) != 0.0 {
                    return;
                }
                let base = layout.global_coord(table.active_key(block), cell);
                for offset in offsets {
                    let mut neighbor = base;
                    for d in 0..D {
                        neighbor[d] += offset[d];
                    }
                    let (nb_block, nb_cell) = layout.global_cell(neighbor);
                    if let Some(nb_index) = table.query(nb_block) {
                        if grid.cell(tag, nb_index, nb_cell) != 0.0 {
                            grid.set_cell(tag_mask, block, cell, 1.0);
                            seeds.fetch_add(1, Ordering::Relaxed);
                            return;
                        }
                    }
                }
            });
            policy.sync();

            if seeds.load(Ordering::Acquire) == 0 {
                break;
            }

            // Assign values from the pre-pass tagged set. Tags are not
            // written here, so neighbor reads stay stable even though
            // two seeds may be adjacent.
            policy.for_each(0..total, |i| {
                let block = (i / cells as usize) as u32;
                let cell = (i % cells as usize) as u32;
                if grid.cell(tag_mask, block, cell) == 0.0 {
                    return;
                }
                let base = layout.global_coord(table.active_key(block), cell);
                let mut best = f32::INFINITY;
                for offset in offsets {
                    let mut neighbor = base;
                    for d in 0..D {
                        neighbor[d] += offset[d];
                    }
                    let (nb_block, nb_cell) = layout.global_cell(neighbor);
                    if let Some(nb_index) = table.query(nb_block) {
                        if grid.cell(tag, nb_index, nb_cell) != 0.0 {
                            best = best.min(grid.cell(value, nb_index, nb_cell));
                        }
                    }
                }
                grid.set_cell(value, block, cell, best + dx);
            });
            policy.sync();

            // Publish the new tags after every value is in place.
            policy.for_each(0..total, |i| {
                let block = (i / cells as usize) as u32;
                let cell = (i % cells as usize) as u32;
                if grid.cell(tag_mask, block, cell) != 0.0 {
                    grid.set_cell(tag, block, cell, 1.0);
                    grid.set_cell(tag_mask, block, cell, 0.0);
                }
            });
            policy.sync();

            iterations += 1;
        }

        Ok(FloodFillOutcome {
            iterations,
            blocks: self.table.len(),
        })
    }

    fn require_channel(&self, name: &str) -> Result<u32, FieldError> {
        self.grid
            .channel_offset(name)
            .ok_or_else(|| FieldError::MissingChannel {
                name: name.to_string(),
            })
    }

    /// Whether any block holding unfinished masked cells is missing a
    /// Moore neighbor block.
    ///
    /// Only such blocks can push the frontier off the allocated domain;
    /// fresh halo blocks carry no mask, so at most one extend is ever
    /// demanded per fill region.
    fn halo_demanded(&self, policy: &ExecutionPolicy, mask: u32, tag: u32) -> bool {
        let active = self.table.len();
        if active == 0 {
            return false;
        }
        let offsets = moore_offsets::<D>();
        let table = &self.table;
        let grid = &self.grid;
        let cells = grid.layout().cells_per_block();
        let offsets = &offsets;
        let demanded = AtomicBool::new(false);
        policy.for_each(0..active as usize, |b| {
            let block = b as u32;
            let base = table.active_key(block);
            let mut missing = false;
            for offset in offsets {
                let mut neighbor = base;
                for d in 0..D {
                    neighbor[d] += offset[d];
                }
                if table.query(neighbor).is_none() {
                    missing = true;
                    break;
                }
            }
            if !missing {
                return;
            }
            for cell in 0..cells {
                if grid.cell(mask, block, cell) != 0.0 && grid.cell(tag, block, cell) == 0.0 {
                    demanded.store(true, Ordering::Relaxed);
                    return;
                }
            }
        });
        policy.sync();
        demanded.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn masked_line_set() -> (SparseLevelSet<2>, u32, u32, u32) {
        // A 1-block-wide masked corridor along +x through two blocks.
        let mut set = SparseLevelSet::<2>::builder()
            .side_length(4)
            .capacity(8)
            .channel("sdf", 1)
            .channel(MASK_CHANNEL, 1)
            .dx(1.0)
            .build()
            .unwrap();
        set.insert_block([0, 0]).unwrap();
        set.insert_block([1, 0]).unwrap();
        set.append_channels(&[ChannelTag::new(TAG_CHANNEL, 1)])
            .unwrap();
        let sdf = set.grid().channel_offset("sdf").unwrap();
        let mask = set.grid().channel_offset(MASK_CHANNEL).unwrap();
        let tag = set.grid().channel_offset(TAG_CHANNEL).unwrap();
        for x in 0..8 {
            assert!(set.set_value_at(mask, [x, 1], 1.0));
        }
        (set, sdf, mask, tag)
    }

    #[test]
    fn missing_mask_channel_aborts() {
        let mut set = SparseLevelSet::<2>::builder()
            .side_length(2)
            .capacity(4)
            .channel("sdf", 1)
            .build()
            .unwrap();
        set.insert_block([0, 0]).unwrap();
        let err = set
            .flood_fill(&ExecutionPolicy::sequential(), "sdf")
            .unwrap_err();
        assert_eq!(
            err,
            FieldError::MissingChannel {
                name: MASK_CHANNEL.to_string()
            }
        );
    }

    #[test]
    fn missing_value_channel_aborts() {
        let mut set = SparseLevelSet::<2>::builder()
            .side_length(2)
            .capacity(4)
            .channel(MASK_CHANNEL, 1)
            .build()
            .unwrap();
        set.insert_block([0, 0]).unwrap();
        let err = set
            .flood_fill(&ExecutionPolicy::sequential(), "sdf")
            .unwrap_err();
        assert!(matches!(err, FieldError::MissingChannel { .. }));
    }

    #[test]
    fn fill_walks_the_corridor_to_a_fixed_point() {
        let (mut set, sdf, _, tag) = masked_line_set();
        // Seed the left end of the corridor with a known zero.
        set.set_value_at(sdf, [0, 1], 0.0);
        set.set_value_at(tag, [0, 1], 1.0);
        let policy = ExecutionPolicy::multi_threaded().with_workers(4);
        let outcome = set.flood_fill(&policy, "sdf").unwrap();

        // One cell per iteration along a 8-cell corridor minus the seed.
        assert_eq!(outcome.iterations, 7);
        for x in 0..8 {
            assert_eq!(set.value_at(tag, [x, 1]), Some(1.0), "cell {x} untagged");
            assert_eq!(set.value_at(sdf, [x, 1]), Some(x as f32));
        }
        // Unmasked cells stay untouched.
        assert_eq!(set.value_at(tag, [0, 0]), Some(0.0));
    }

    #[test]
    fn fill_without_seeds_terminates_immediately() {
        let (mut set, _, _, _) = masked_line_set();
        let outcome = set
            .flood_fill(&ExecutionPolicy::sequential(), "sdf")
            .unwrap();
        assert_eq!(outcome.iterations, 0);
    }

    #[test]
    fn diagonal_adjacency_propagates() {
        let (mut set, sdf, _, tag) = masked_line_set();
        let mask = set.grid().channel_offset(MASK_CHANNEL).unwrap();
        // Mask a diagonal step the corridor has to turn through.
        set.set_value_at(mask, [3, 2], 1.0);
        set.set_value_at(sdf, [2, 1], 0.0);
        set.set_value_at(tag, [2, 1], 1.0);
        let outcome = set
            .flood_fill(&ExecutionPolicy::sequential(), "sdf")
            .unwrap();
        assert!(outcome.iterations >= 1);
        // The diagonal neighbor is one step from the seed.
        assert_eq!(set.value_at(sdf, [3, 2]), Some(1.0));
        assert_eq!(set.value_at(tag, [3, 2]), Some(1.0));
    }
}
