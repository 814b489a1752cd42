//! Per-class index of free slots

use super::pool::SlotPool;
use super::slot::SlotIndex;
use super::vehicle_class::{ClassMap, VehicleClass};
use crate::error::{Error, Result};
use std::collections::BTreeSet;

/// Ordered free set for every class
///
/// `take` always yields the lowest free index of the class, which is what
/// "nearest slot" means here. Both `take` and `put` are O(log n).
/// A `BTreeSet` rather than a heap so a duplicate `put` is detected instead
/// of silently queued twice.
#[derive(Debug, Default)]
pub struct FreeIndex {
    free: ClassMap<BTreeSet<SlotIndex>>,
}

impl FreeIndex {
    /// Index every slot of `pool` that is currently free
    pub fn from_pool(pool: &SlotPool) -> Self {
        let mut free: ClassMap<BTreeSet<SlotIndex>> = ClassMap::default();
        for slot in pool.iter().filter(|slot| !slot.is_occupied()) {
            free[slot.class()].insert(slot.index());
        }
        Self { free }
    }

    /// Remove and return the lowest free index of `class`
    pub fn take(&mut self, class: VehicleClass) -> Option<SlotIndex> {
        self.free[class].pop_first()
    }

    /// Return `index` to the free set of `class`
    pub fn put(&mut self, class: VehicleClass, index: SlotIndex) -> Result<()> {
        if !self.free[class].insert(index) {
            return Err(Error::InvariantViolation(format!(
                "Slot {} returned to {} free index twice",
                index, class
            )));
        }
        Ok(())
    }

    pub fn contains(&self, class: VehicleClass, index: SlotIndex) -> bool {
        self.free[class].contains(&index)
    }

    /// Number of free slots of `class`
    pub fn free_count(&self, class: VehicleClass) -> usize {
        self.free[class].len()
    }

    pub fn free_counts(&self) -> ClassMap<usize> {
        self.free.map(BTreeSet::len)
    }

    pub fn total_free(&self) -> usize {
        self.free.iter().map(|(_, set)| set.len()).sum()
    }

    /// Free indices of `class`, ascending
    pub fn iter(&self, class: VehicleClass) -> impl Iterator<Item = SlotIndex> + '_ {
        self.free[class].iter().copied()
    }
}
