//! Fixed pool of typed slots

use super::slot::{Assignment, Slot, SlotIndex};
use super::vehicle_class::ClassMap;
use crate::error::{Error, Result};
use tracing::debug;

/// Largest facility built unless configured otherwise
pub const DEFAULT_MAX_SLOTS: usize = 100_000;

/// Owns every slot in the facility
///
/// Slots are laid out in contiguous blocks per class (cars first, then
/// bikes, then trucks). A slot's class never changes after the pool is built.
#[derive(Debug, Default)]
pub struct SlotPool {
    slots: Vec<Slot>,
    counts: ClassMap<usize>,
}

impl SlotPool {
    /// Build a pool with the given number of slots per class, all free
    pub fn new(counts: &ClassMap<u32>) -> Self {
        let mut pool = Self::default();
        pool.initialize(counts);
        pool
    }

    /// Total slots `counts` describes, without overflowing
    pub fn total(counts: &ClassMap<u32>) -> u64 {
        counts.iter().map(|(_, &n)| u64::from(n)).sum()
    }

    /// Reject facilities larger than `max_slots` before anything is allocated
    pub fn check_size(counts: &ClassMap<u32>, max_slots: usize) -> Result<()> {
        let total = Self::total(counts);
        if total > max_slots as u64 {
            return Err(Error::InvalidArgument(format!(
                "Facility of {} slots exceeds the limit of {}",
                total, max_slots
            )));
        }
        Ok(())
    }

    /// Rebuild the pool, discarding all prior state
    ///
    /// Callers bound the size with [`SlotPool::check_size`].
    pub fn initialize(&mut self, counts: &ClassMap<u32>) {
        let total = Self::total(counts) as usize;
        let mut slots = Vec::with_capacity(total);

        for (class, &count) in counts.iter() {
            for _ in 0..count {
                let index = SlotIndex(slots.len());
                slots.push(Slot::new(index, class));
            }
        }

        self.slots = slots;
        self.counts = counts.map(|&n| n as usize);
        debug!(total, car = counts.car, bike = counts.bike, truck = counts.truck, "Slot pool built");
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots of each class
    pub fn counts(&self) -> &ClassMap<usize> {
        &self.counts
    }

    pub fn slot(&self, index: SlotIndex) -> Result<&Slot> {
        self.slots
            .get(index.0)
            .ok_or_else(|| Error::NotFound(format!("Slot {} does not exist", index)))
    }

    fn slot_mut(&mut self, index: SlotIndex) -> Result<&mut Slot> {
        self.slots
            .get_mut(index.0)
            .ok_or_else(|| Error::InvariantViolation(format!("Slot {} out of range", index)))
    }

    /// All slots in index order
    pub fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }

    /// Mark a slot occupied by `assignment`
    pub fn assign(&mut self, index: SlotIndex, assignment: Assignment) -> Result<()> {
        self.slot_mut(index)?.assign(assignment)
    }

    /// Mark a slot free and hand back the assignment it held
    pub fn release_slot(&mut self, index: SlotIndex) -> Result<Assignment> {
        self.slot_mut(index)?.release()
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_occupied()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::slot::{TicketId, VehicleId};
    use crate::allocation::vehicle_class::VehicleClass;

    fn assignment(pool: &SlotPool, index: usize, vehicle: &str) -> Assignment {
        let slot = pool.slot(SlotIndex(index)).unwrap();
        Assignment {
            ticket: TicketId(index as u64 + 1),
            vehicle: VehicleId::new(vehicle).unwrap(),
            class: slot.class(),
            slot: slot.index(),
        }
    }

    #[test]
    fn test_pool_layout() -> Result<()> {
        let pool = SlotPool::new(&ClassMap::new(2, 1, 2));

        assert_eq!(pool.len(), 5);
        assert_eq!(pool.slot(SlotIndex(0))?.class(), VehicleClass::Compact);
        assert_eq!(pool.slot(SlotIndex(1))?.class(), VehicleClass::Compact);
        assert_eq!(pool.slot(SlotIndex(2))?.class(), VehicleClass::TwoWheeler);
        assert_eq!(pool.slot(SlotIndex(3))?.class(), VehicleClass::HeavyGoods);
        assert_eq!(pool.slot(SlotIndex(4))?.class(), VehicleClass::HeavyGoods);
        assert!(pool.slot(SlotIndex(5)).is_err());

        let trucks: Vec<_> = pool
            .iter()
            .filter(|slot| slot.class() == VehicleClass::HeavyGoods)
            .map(Slot::index)
            .collect();
        assert_eq!(trucks, vec![SlotIndex(3), SlotIndex(4)]);
        assert_eq!(pool.counts().bike, 1);
        Ok(())
    }

    #[test]
    fn test_assign_and_release() -> Result<()> {
        let mut pool = SlotPool::new(&ClassMap::new(2, 0, 0));
        let a = assignment(&pool, 1, "KA-01");

        pool.assign(SlotIndex(1), a.clone())?;
        assert_eq!(pool.occupied_count(), 1);
        assert!(pool.assign(SlotIndex(1), a.clone()).is_err());

        assert_eq!(pool.release_slot(SlotIndex(1))?, a);
        assert_eq!(pool.occupied_count(), 0);
        assert!(matches!(
            pool.release_slot(SlotIndex(1)),
            Err(Error::InvariantViolation(_))
        ));
        Ok(())
    }

    #[test]
    fn test_initialize_discards_state() -> Result<()> {
        let mut pool = SlotPool::new(&ClassMap::new(1, 1, 0));
        let a = assignment(&pool, 0, "KA-01");
        pool.assign(SlotIndex(0), a)?;

        pool.initialize(&ClassMap::new(0, 0, 3));
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.occupied_count(), 0);
        assert!(pool.iter().all(|s| s.class() == VehicleClass::HeavyGoods));
        Ok(())
    }

    #[test]
    fn test_size_limit() {
        let huge = ClassMap::new(u32::MAX, u32::MAX, u32::MAX);
        assert_eq!(SlotPool::total(&huge), 3 * u64::from(u32::MAX));
        assert!(matches!(
            SlotPool::check_size(&huge, DEFAULT_MAX_SLOTS),
            Err(Error::InvalidArgument(_))
        ));
        assert!(SlotPool::check_size(&ClassMap::new(2, 2, 1), 5).is_ok());
        assert!(SlotPool::check_size(&ClassMap::new(2, 2, 2), 5).is_err());
    }

    #[test]
    fn test_empty_pool() {
        let pool = SlotPool::new(&ClassMap::default());
        assert!(pool.is_empty());
        assert_eq!(pool.occupied_count(), 0);
    }
}
