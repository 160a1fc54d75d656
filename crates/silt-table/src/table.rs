//! The [`HashTable`] implementation.

use crate::error::TableError;
use silt_core::{hash_key, pack_key, unpack_key, BlockIndex, PackedKey, EMPTY_KEY, NIL_INDEX};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Marks a slot whose claim was rolled back by a capacity failure.
///
/// Valid packed keys never set bit 63, and [`EMPTY_KEY`] is all ones,
/// so this word collides with neither. Probes walk past it; it is
/// never reused within a generation.
const DEAD_KEY: PackedKey = 1 << 63;

/// Concurrent fixed-capacity map from block coordinate to dense index.
///
/// Slots hold the full packed coordinate in a single atomic word, so a
/// claim is one compare-and-swap. Linear probing from the key's hash;
/// the slot array is sized to `next_power_of_two(capacity / 0.7)` so
/// the load factor stays at or below 0.7 even when the table is full.
///
/// Invariants: keys in non-empty slots are unique; for every occupied
/// slot, `active_key(index_of(slot)) == key_of(slot)`; the insertion
/// counter never settles above `capacity`.
pub struct HashTable<const D: usize> {
    slots: Box<[AtomicU64]>,
    slot_index: Box<[AtomicU32]>,
    active_keys: Box<[AtomicU64]>,
    count: AtomicU32,
    capacity: u32,
    slot_mask: usize,
}

impl<const D: usize> HashTable<D> {
    /// Create a table able to hold `capacity` distinct block keys.
    pub fn with_capacity(capacity: u32) -> Result<Self, TableError> {
        if capacity == 0 {
            return Err(TableError::ZeroCapacity);
        }
        // Load factor <= 0.7 at full occupancy, rounded to a power of
        // two so probing can mask instead of mod.
        let slot_count = ((capacity as usize * 10).div_ceil(7)).next_power_of_two();
        Ok(Self {
            slots: (0..slot_count).map(|_| AtomicU64::new(EMPTY_KEY)).collect(),
            slot_index: (0..slot_count).map(|_| AtomicU32::new(NIL_INDEX)).collect(),
            active_keys: (0..capacity).map(|_| AtomicU64::new(EMPTY_KEY)).collect(),
            count: AtomicU32::new(0),
            capacity,
            slot_mask: slot_count - 1,
        })
    }

    /// Maximum number of distinct keys this table can hold.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of keys currently assigned an index.
    pub fn len(&self) -> u32 {
        self.count.load(Ordering::Acquire).min(self.capacity)
    }

    /// Returns `true` when no keys are present.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert a block coordinate, returning its dense index.
    ///
    /// Concurrency-safe: the first worker to claim the key's slot
    /// assigns the index; every other worker inserting the same key —
    /// simultaneously or later — receives that same index. Fails with
    /// [`TableError::CapacityExceeded`] once `capacity` distinct keys
    /// exist; the failed insert leaves every prior entry intact.
    pub fn insert(&self, coord: [i32; D]) -> Result<BlockIndex, TableError> {
        let key = pack_key(coord);
        let mut slot = hash_key(key) as usize & self.slot_mask;
        for _ in 0..=self.slot_mask {
            let mut current = self.slots[slot].load(Ordering::Acquire);
            if current == EMPTY_KEY {
                match self.slots[slot].compare_exchange(
                    EMPTY_KEY,
                    key,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                ) {
                    Ok(_) => {
                        let index = self.count.fetch_add(1, Ordering::AcqRel);
                        if index >= self.capacity {
                            // Roll the claim back: mark the slot dead so
                            // probes walk past it, and rebalance the
                            // counter. No published entry is touched.
                            self.slots[slot].store(DEAD_KEY, Ordering::Release);
                            self.count.fetch_sub(1, Ordering::AcqRel);
                            return Err(TableError::CapacityExceeded {
                                capacity: self.capacity,
                            });
                        }
                        self.slot_index[slot].store(index, Ordering::Release);
                        self.active_keys[index as usize].store(key, Ordering::Release);
                        return Ok(index);
                    }
                    Err(actual) => current = actual,
                }
            }
            if current == key {
                return self.await_published_index(slot, key);
            }
            // Someone else's key (or a dead claim): keep probing.
            slot = (slot + 1) & self.slot_mask;
        }
        Err(TableError::CapacityExceeded {
            capacity: self.capacity,
        })
    }

    /// Look up a block coordinate.
    ///
    /// Identical probe sequence to [`insert`](Self::insert), read-only.
    /// Returns `None` for coordinates never inserted.
    pub fn query(&self, coord: [i32; D]) -> Option<BlockIndex> {
        let key = pack_key(coord);
        let mut slot = hash_key(key) as usize & self.slot_mask;
        for _ in 0..=self.slot_mask {
            let current = self.slots[slot].load(Ordering::Acquire);
            if current == EMPTY_KEY {
                return None;
            }
            if current == key {
                return self.await_published_index(slot, key).ok();
            }
            slot = (slot + 1) & self.slot_mask;
        }
        None
    }

    /// The coordinate assigned to `index`, in first-claim order.
    ///
    /// Meaningful only for `index < len()` and only after the insert
    /// pass that produced `index` has been synchronized.
    pub fn active_key(&self, index: BlockIndex) -> [i32; D] {
        debug_assert!(index < self.len(), "active_key index {index} out of range");
        unpack_key(self.active_keys[index as usize].load(Ordering::Acquire))
    }

    /// Iterate the active coordinates in assigned-index order.
    pub fn active_coords(&self) -> impl Iterator<Item = [i32; D]> + '_ {
        (0..self.len()).map(|i| self.active_key(i))
    }

    /// Clear every slot and reset the counter to zero.
    ///
    /// Used before a full rebuild. Exclusive access makes this safe
    /// against in-flight probes by construction.
    pub fn reset(&mut self) {
        for slot in self.slots.iter() {
            slot.store(EMPTY_KEY, Ordering::Relaxed);
        }
        for index in self.slot_index.iter() {
            index.store(NIL_INDEX, Ordering::Relaxed);
        }
        for key in self.active_keys.iter() {
            key.store(EMPTY_KEY, Ordering::Relaxed);
        }
        self.count.store(0, Ordering::Release);
    }

    /// Grow (or shrink, down to the current count) the key capacity.
    ///
    /// Every existing key keeps its index — block storage is
    /// index-aligned, so indices must survive a resize. The new slot
    /// array is rebuilt by re-probing each active key; the old
    /// generation's buffers stay readable until the rebuild completes.
    pub fn resize(&mut self, new_capacity: u32) -> Result<(), TableError> {
        let count = self.len();
        if new_capacity < count {
            return Err(TableError::CapacityExceeded {
                capacity: new_capacity,
            });
        }
        let rebuilt = Self::with_capacity(new_capacity)?;
        for index in 0..count {
            let key = self.active_keys[index as usize].load(Ordering::Acquire);
            let mut slot = hash_key(key) as usize & rebuilt.slot_mask;
            loop {
                if rebuilt.slots[slot].load(Ordering::Relaxed) == EMPTY_KEY {
                    rebuilt.slots[slot].store(key, Ordering::Relaxed);
                    rebuilt.slot_index[slot].store(index, Ordering::Relaxed);
                    rebuilt.active_keys[index as usize].store(key, Ordering::Relaxed);
                    break;
                }
                slot = (slot + 1) & rebuilt.slot_mask;
            }
        }
        rebuilt.count.store(count, Ordering::Release);
        *self = rebuilt;
        Ok(())
    }

    /// Wait for the claiming worker to publish the slot's index.
    ///
    /// The window between a slot claim and its index store is a few
    /// instructions on the claiming worker, so this spin is short. If
    /// the claim was rolled back by a capacity failure instead, the
    /// slot key changes to the dead marker and the key is not present.
    fn await_published_index(&self, slot: usize, key: PackedKey) -> Result<BlockIndex, TableError> {
        loop {
            let index = self.slot_index[slot].load(Ordering::Acquire);
            if index != NIL_INDEX {
                return Ok(index);
            }
            if self.slots[slot].load(Ordering::Acquire) != key {
                return Err(TableError::CapacityExceeded {
                    capacity: self.capacity,
                });
            }
            std::hint::spin_loop();
        }
    }
}

impl<const D: usize> std::fmt::Debug for HashTable<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashTable")
            .field("dim", &D)
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("slots", &(self.slot_mask + 1))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_query_round_trips() {
        let table = HashTable::<3>::with_capacity(64).unwrap();
        let coords = [[0, 0, 0], [1, 0, 0], [-4, 7, 2], [100, -100, 55]];
        let mut indices = Vec::new();
        for &c in &coords {
            indices.push(table.insert(c).unwrap());
        }
        for (&c, &i) in coords.iter().zip(&indices) {
            assert_eq!(table.query(c), Some(i));
            assert_eq!(table.active_key(i), c);
        }
        assert_eq!(table.query([9, 9, 9]), None);
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn repeated_insert_returns_same_index() {
        let table = HashTable::<2>::with_capacity(8).unwrap();
        let a = table.insert([3, -3]).unwrap();
        let b = table.insert([3, -3]).unwrap();
        assert_eq!(a, b);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn indices_are_dense_in_claim_order() {
        let table = HashTable::<1>::with_capacity(16).unwrap();
        for i in 0..10 {
            assert_eq!(table.insert([i * 11 - 50]).unwrap(), i as u32);
        }
        let coords: Vec<[i32; 1]> = table.active_coords().collect();
        assert_eq!(coords.len(), 10);
        for (i, c) in coords.iter().enumerate() {
            assert_eq!(c[0], i as i32 * 11 - 50);
        }
    }

    #[test]
    fn concurrent_same_key_inserts_agree() {
        // The reference scenario: capacity 8, 3D, two workers inserting
        // (0,0,0), (1,0,0), (0,0,0). Exactly two indices are assigned
        // and every insert of (0,0,0) observes the same one.
        let table = HashTable::<3>::with_capacity(8).unwrap();
        let (first, second) = std::thread::scope(|scope| {
            let w1 = scope.spawn(|| {
                (
                    table.insert([0, 0, 0]).unwrap(),
                    table.insert([1, 0, 0]).unwrap(),
                )
            });
            let w2 = scope.spawn(|| table.insert([0, 0, 0]).unwrap());
            (w1.join().unwrap(), w2.join().unwrap())
        });
        assert_eq!(first.0, second);
        assert_eq!(table.len(), 2);
        let active: Vec<[i32; 3]> = table.active_coords().collect();
        assert!(active.contains(&[0, 0, 0]) && active.contains(&[1, 0, 0]));
        // Dense indices agree with the published key array.
        assert_eq!(table.active_key(first.0), [0, 0, 0]);
        assert_eq!(table.active_key(first.1), [1, 0, 0]);
    }

    #[test]
    fn hammered_insert_yields_no_duplicates() {
        let table = HashTable::<3>::with_capacity(512).unwrap();
        let threads = 8;
        std::thread::scope(|scope| {
            for _ in 0..threads {
                let table = &table;
                scope.spawn(move || {
                    // Every thread races over the same 256 keys.
                    for i in 0..256 {
                        let c = [i % 16 - 8, i / 16, (i * 3) % 11];
                        table.insert(c).unwrap();
                    }
                });
            }
        });
        assert_eq!(table.len(), 256);
        let mut seen = std::collections::HashSet::new();
        for c in table.active_coords() {
            assert!(seen.insert(c), "duplicate active key {c:?}");
            assert_eq!(table.query(c), Some(seen.len() as u32 - 1));
        }
    }

    #[test]
    fn capacity_overflow_is_fatal_but_not_corrupting() {
        let table = HashTable::<2>::with_capacity(4).unwrap();
        for i in 0..4 {
            table.insert([i, 0]).unwrap();
        }
        let err = table.insert([99, 99]).unwrap_err();
        assert_eq!(err, TableError::CapacityExceeded { capacity: 4 });
        // The failed key is absent; everything else is intact.
        assert_eq!(table.query([99, 99]), None);
        assert_eq!(table.len(), 4);
        for i in 0..4 {
            assert_eq!(table.query([i, 0]), Some(i as u32));
        }
        // Re-inserting an existing key is still fine at capacity.
        assert_eq!(table.insert([2, 0]).unwrap(), 2);
    }

    #[test]
    fn reset_empties_the_table() {
        let mut table = HashTable::<3>::with_capacity(8).unwrap();
        table.insert([1, 2, 3]).unwrap();
        table.reset();
        assert_eq!(table.len(), 0);
        assert_eq!(table.query([1, 2, 3]), None);
        assert_eq!(table.insert([1, 2, 3]).unwrap(), 0);
    }

    #[test]
    fn resize_preserves_every_assignment() {
        let mut table = HashTable::<3>::with_capacity(8).unwrap();
        let coords: Vec<[i32; 3]> = (0..8).map(|i| [i, -i, i * 2]).collect();
        for c in &coords {
            table.insert(*c).unwrap();
        }
        table.resize(64).unwrap();
        assert_eq!(table.capacity(), 64);
        assert_eq!(table.len(), 8);
        for (i, c) in coords.iter().enumerate() {
            assert_eq!(table.query(*c), Some(i as u32));
            assert_eq!(table.active_key(i as u32), *c);
        }
        // And the grown table accepts what the old one could not.
        table.insert([7; 3]).unwrap();
    }

    #[test]
    fn resize_below_count_is_rejected() {
        let mut table = HashTable::<1>::with_capacity(8).unwrap();
        for i in 0..5 {
            table.insert([i]).unwrap();
        }
        assert!(table.resize(4).is_err());
        assert_eq!(table.capacity(), 8);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert_eq!(
            HashTable::<3>::with_capacity(0).unwrap_err(),
            TableError::ZeroCapacity
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn every_inserted_key_round_trips(
                coords in prop::collection::hash_set(
                    prop::array::uniform3(-100i32..100),
                    1..64,
                ),
            ) {
                let coords: Vec<[i32; 3]> = coords.into_iter().collect();
                let table = HashTable::<3>::with_capacity(64).unwrap();
                let mut indices = Vec::new();
                for &c in &coords {
                    indices.push(table.insert(c).unwrap());
                }
                for (&c, &i) in coords.iter().zip(&indices) {
                    prop_assert_eq!(table.query(c), Some(i));
                    prop_assert_eq!(table.active_key(i), c);
                }
                // A coordinate outside the generated domain is absent.
                prop_assert_eq!(table.query([1000, 1000, 1000]), None);
                prop_assert_eq!(table.len() as usize, coords.len());
            }
        }
    }
}
