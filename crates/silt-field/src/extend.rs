//! Domain growth and compaction.

use crate::error::FieldError;
use crate::set::SparseLevelSet;
use silt_core::{fan_out, moore_offsets};
use silt_exec::ExecutionPolicy;
use silt_grid::{BlockRef, Grid};
use silt_table::{HashTable, TableError};
use std::sync::atomic::{AtomicU32, Ordering};

impl<const D: usize> SparseLevelSet<D> {
    /// Grow the active set by `layers` whole neighbor layers.
    ///
    /// Each pass allocates every Moore neighbor of every active block,
    /// zero-initialising the fresh blocks. Capacity is grown up front
    /// to cover the worst-case fan-out of the pass, so the concurrent
    /// insert sweep cannot overflow. Monotonic: the block count never
    /// decreases, and after `extend_domain(n)` every block within
    /// Chebyshev distance `n` of the original set is active.
    pub fn extend_domain(
        &mut self,
        policy: &ExecutionPolicy,
        layers: u32,
    ) -> Result<(), FieldError> {
        for _ in 0..layers {
            self.extend_one_layer(policy)?;
        }
        Ok(())
    }

    pub(crate) fn extend_one_layer(&mut self, policy: &ExecutionPolicy) -> Result<(), FieldError> {
        let before = self.table.len();
        if before == 0 {
            return Ok(());
        }

        // Worst case every neighbor of every block is new.
        let worst = before as u64 * (fan_out::<D>() as u64 + 1);
        if worst > self.capacity() as u64 {
            let grown = u32::try_from(worst).map_err(|_| {
                FieldError::Table(TableError::CapacityExceeded {
                    capacity: self.capacity(),
                })
            })?;
            self.resize(grown)?;
        }

        let offsets = moore_offsets::<D>();
        let table = &self.table;
        let failures = AtomicU32::new(0);
        policy.for_each(0..before as usize, |i| {
            let base = table.active_key(i as u32);
            for offset in &offsets {
                let mut neighbor = base;
                for d in 0..D {
                    neighbor[d] += offset[d];
                }
                if table.insert(neighbor).is_err() {
                    failures.fetch_add(1, Ordering::Relaxed);
                }
            }
        });
        policy.sync();
        if failures.load(Ordering::Acquire) > 0 {
            return Err(FieldError::Table(TableError::CapacityExceeded {
                capacity: self.capacity(),
            }));
        }

        // Fresh blocks occupy the index range the pass appended; their
        // channels start from whatever the slab held, so clear them.
        let after = self.table.len();
        let grid = &self.grid;
        policy.for_each(before as usize..after as usize, |i| {
            grid.zero_block(i as u32);
        });
        policy.sync();
        Ok(())
    }

    /// Compact the active set down to the blocks `predicate` keeps.
    ///
    /// The predicate sees each block's coordinate and a handle to its
    /// channel data. Marks are prefix-summed into compacted destination
    /// indices, survivors are inserted into a fresh table in their
    /// original relative order (keeping their original coordinates),
    /// their channel data is copied across, and the new generation is
    /// swapped in. Returns the survivor count.
    ///
    /// Postcondition: the active set is exactly `{block : predicate}`,
    /// and nothing from a discarded block remains addressable.
    pub fn refit_domain<P>(
        &mut self,
        policy: &ExecutionPolicy,
        predicate: P,
    ) -> Result<u32, FieldError>
    where
        P: Fn([i32; D], BlockRef<'_, D>) -> bool + Sync,
    {
        let count = self.table.len();
        if count == 0 {
            return Ok(0);
        }

        // Mark pass.
        let marks: Vec<AtomicU32> = (0..count).map(|_| AtomicU32::new(0)).collect();
        {
            let table = &self.table;
            let grid = &self.grid;
            let marks = &marks;
            let predicate = &predicate;
            policy.for_each(0..count as usize, |i| {
                let coord = table.active_key(i as u32);
                if predicate(coord, grid.block(i as u32)) {
                    marks[i].store(1, Ordering::Relaxed);
                }
            });
            policy.sync();
        }
        let marks: Vec<u32> = marks.into_iter().map(AtomicU32::into_inner).collect();

        // Exclusive prefix sum gives each survivor its destination.
        let mut destinations = vec![0u32; count as usize];
        policy.exclusive_scan(&marks, &mut destinations, 0, |a, b| a + b);
        policy.sync();
        let survivors = destinations[count as usize - 1] + marks[count as usize - 1];

        // Fresh generation sized to the survivor count. The old table
        // and grid stay fully readable until the final swap.
        let table = HashTable::with_capacity(survivors.max(1))?;
        let grid = Grid::new(
            self.grid.resource().clone(),
            *self.grid.layout(),
            &self.grid.channels().tags(),
            survivors.max(1),
        )?;
        for i in 0..count as usize {
            if marks[i] == 1 {
                let index = table.insert(self.table.active_key(i as u32))?;
                debug_assert_eq!(index, destinations[i]);
            }
        }
        {
            let old_grid = &self.grid;
            let new_grid = &grid;
            let marks = &marks;
            let destinations = &destinations;
            policy.for_each(0..count as usize, |i| {
                if marks[i] == 1 {
                    new_grid.copy_block_from(old_grid, i as u32, destinations[i]);
                }
            });
            policy.sync();
        }

        self.table = table;
        self.grid = grid;
        Ok(survivors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use silt_core::chebyshev;

    fn seeded() -> SparseLevelSet<2> {
        let set = SparseLevelSet::<2>::builder()
            .side_length(2)
            .capacity(4)
            .channel("sdf", 1)
            .build()
            .unwrap();
        set.insert_block([0, 0]).unwrap();
        set
    }

    #[test]
    fn one_layer_covers_the_moore_neighborhood() {
        let mut set = seeded();
        let policy = ExecutionPolicy::sequential();
        set.extend_domain(&policy, 1).unwrap();
        assert_eq!(set.active_blocks(), 9);
        for x in -1..=1 {
            for y in -1..=1 {
                assert!(set.query_block([x, y]).is_some());
            }
        }
    }

    #[test]
    fn extension_grows_capacity_as_needed() {
        let mut set = seeded();
        let policy = ExecutionPolicy::multi_threaded().with_workers(4);
        set.extend_domain(&policy, 3).unwrap();
        // Every block within Chebyshev distance 3 is present.
        assert_eq!(set.active_blocks(), 49);
        for coord in set.table().active_coords() {
            assert!(chebyshev(coord, [0, 0]) <= 3);
        }
    }

    #[test]
    fn extension_is_monotonic_and_preserves_data() {
        let mut set = seeded();
        set.set_value_at(0, [0, 0], 42.0);
        let policy = ExecutionPolicy::sequential();
        let before = set.active_blocks();
        set.extend_domain(&policy, 1).unwrap();
        assert!(set.active_blocks() >= before);
        assert_eq!(set.value_at(0, [0, 0]), Some(42.0));
        // Fresh blocks come up zeroed.
        assert_eq!(set.value_at(0, [-1, -1]), Some(0.0));
    }

    #[test]
    fn refit_keeps_exactly_the_predicate_set_in_order() {
        let mut set = SparseLevelSet::<2>::builder()
            .side_length(2)
            .capacity(16)
            .channel("sdf", 1)
            .build()
            .unwrap();
        let coords: Vec<[i32; 2]> = (0..10).map(|i| [i - 5, 2 * i]).collect();
        for (i, &c) in coords.iter().enumerate() {
            let index = set.insert_block(c).unwrap();
            set.grid().set_cell(0, index, 0, i as f32);
        }
        let policy = ExecutionPolicy::multi_threaded().with_workers(3);
        let survivors = set
            .refit_domain(&policy, |coord, _| coord[0] >= 0)
            .unwrap();
        assert_eq!(survivors, 5);
        assert_eq!(set.active_blocks(), 5);
        // Survivors keep their original coordinates and relative order,
        // and their channel data moved with them.
        let kept: Vec<[i32; 2]> = set.table().active_coords().collect();
        assert_eq!(kept, coords[5..].to_vec());
        for (new_index, original) in (5..10).enumerate() {
            assert_eq!(
                set.grid().cell(0, new_index as u32, 0),
                original as f32
            );
        }
        // Discarded blocks are gone.
        assert_eq!(set.query_block([-5, 0]), None);
    }

    #[test]
    fn refit_with_nothing_kept_empties_the_set() {
        let mut set = seeded();
        let policy = ExecutionPolicy::sequential();
        let survivors = set.refit_domain(&policy, |_, _| false).unwrap();
        assert_eq!(survivors, 0);
        assert_eq!(set.active_blocks(), 0);
    }

    #[test]
    fn refit_predicate_sees_block_data() {
        let mut set = SparseLevelSet::<2>::builder()
            .side_length(2)
            .capacity(8)
            .channel("mass", 1)
            .build()
            .unwrap();
        for i in 0..4 {
            let index = set.insert_block([i, 0]).unwrap();
            if i % 2 == 0 {
                set.grid().set_cell(0, index, 3, 1.0);
            }
        }
        let policy = ExecutionPolicy::sequential();
        let survivors = set
            .refit_domain(&policy, |_, block| block.cell(0, 3) > 0.0)
            .unwrap();
        assert_eq!(survivors, 2);
        assert!(set.query_block([0, 0]).is_some());
        assert!(set.query_block([1, 0]).is_none());
    }
}
