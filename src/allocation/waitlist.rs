//! FIFO waitlist of vehicles with no free slot of their class

use super::slot::VehicleId;
use super::vehicle_class::{ClassMap, VehicleClass};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};

/// A pending request for a slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaitEntry {
    pub vehicle: VehicleId,
    pub class: VehicleClass,
    /// Global arrival order across all classes
    #[serde(skip)]
    arrival: u64,
}

/// One queue per class
///
/// Entries of different classes never block each other; within a class,
/// service is strictly in arrival order. The arrival counter only exists to
/// report the combined queue in the order vehicles turned up.
#[derive(Debug, Default)]
pub struct Waitlist {
    queues: ClassMap<VecDeque<WaitEntry>>,
    /// Every vehicle in any queue, for O(1) membership checks
    waiting: HashSet<VehicleId>,
    next_arrival: u64,
}

impl Waitlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a request; returns its 1-based position within its class
    pub fn enqueue(&mut self, vehicle: VehicleId, class: VehicleClass) -> usize {
        let newly_waiting = self.waiting.insert(vehicle.clone());
        debug_assert!(newly_waiting, "vehicle enqueued twice");

        let entry = WaitEntry {
            vehicle,
            class,
            arrival: self.next_arrival,
        };
        self.next_arrival += 1;

        let queue = &mut self.queues[class];
        queue.push_back(entry);
        queue.len()
    }

    /// Oldest request of `class`, if any
    pub fn peek_front(&self, class: VehicleClass) -> Option<&WaitEntry> {
        self.queues[class].front()
    }

    /// Remove and return the oldest request of `class`
    pub fn dequeue_front(&mut self, class: VehicleClass) -> Option<WaitEntry> {
        let entry = self.queues[class].pop_front()?;
        self.waiting.remove(&entry.vehicle);
        Some(entry)
    }

    /// Number of requests waiting for `class`
    pub fn size(&self, class: VehicleClass) -> usize {
        self.queues[class].len()
    }

    pub fn len(&self) -> usize {
        self.queues.iter().map(|(_, q)| q.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 1-based position of `vehicle` within its class queue
    ///
    /// Vehicles that are not waiting are answered without scanning.
    pub fn position(&self, vehicle: &str) -> Option<(VehicleClass, usize)> {
        let vehicle = VehicleId::normalize(vehicle);
        if !self.contains(vehicle) {
            return None;
        }
        VehicleClass::ALL.into_iter().find_map(|class| {
            self.queues[class]
                .iter()
                .position(|entry| entry.vehicle.as_str() == vehicle)
                .map(|pos| (class, pos + 1))
        })
    }

    pub fn contains(&self, vehicle: &str) -> bool {
        self.waiting.contains(VehicleId::normalize(vehicle))
    }

    /// Every waiting request, oldest first across all classes
    pub fn entries(&self) -> Vec<&WaitEntry> {
        let mut all: Vec<&WaitEntry> = self.queues.iter().flat_map(|(_, q)| q.iter()).collect();
        all.sort_by_key(|entry| entry.arrival);
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vid(s: &str) -> VehicleId {
        VehicleId::new(s).unwrap()
    }

    #[test]
    fn test_fifo_within_class() {
        let mut wl = Waitlist::new();
        assert_eq!(wl.enqueue(vid("A"), VehicleClass::Compact), 1);
        assert_eq!(wl.enqueue(vid("B"), VehicleClass::Compact), 2);
        assert_eq!(wl.enqueue(vid("C"), VehicleClass::Compact), 3);

        assert_eq!(wl.dequeue_front(VehicleClass::Compact).unwrap().vehicle, vid("A"));
        assert_eq!(wl.dequeue_front(VehicleClass::Compact).unwrap().vehicle, vid("B"));
        assert_eq!(wl.dequeue_front(VehicleClass::Compact).unwrap().vehicle, vid("C"));
        assert!(wl.dequeue_front(VehicleClass::Compact).is_none());
    }

    #[test]
    fn test_other_classes_not_disturbed() {
        let mut wl = Waitlist::new();
        wl.enqueue(vid("T1"), VehicleClass::HeavyGoods);
        wl.enqueue(vid("C1"), VehicleClass::Compact);
        wl.enqueue(vid("T2"), VehicleClass::HeavyGoods);
        wl.enqueue(vid("C2"), VehicleClass::Compact);

        // Serving cars leaves trucks queued in their original order
        assert_eq!(wl.peek_front(VehicleClass::Compact).unwrap().vehicle, vid("C1"));
        wl.dequeue_front(VehicleClass::Compact);

        let order: Vec<_> = wl.entries().iter().map(|e| e.vehicle.to_string()).collect();
        assert_eq!(order, vec!["T1", "T2", "C2"]);
        assert_eq!(wl.size(VehicleClass::HeavyGoods), 2);
        assert_eq!(wl.size(VehicleClass::TwoWheeler), 0);
        assert_eq!(wl.len(), 3);
    }

    #[test]
    fn test_position_lookup() {
        let mut wl = Waitlist::new();
        wl.enqueue(vid("A"), VehicleClass::TwoWheeler);
        wl.enqueue(vid("B"), VehicleClass::Compact);
        wl.enqueue(vid("C"), VehicleClass::TwoWheeler);

        assert_eq!(wl.position("C"), Some((VehicleClass::TwoWheeler, 2)));
        assert_eq!(wl.position("B"), Some((VehicleClass::Compact, 1)));
        assert_eq!(wl.position(" A "), Some((VehicleClass::TwoWheeler, 1)));
        assert!(wl.contains("B"));
        assert!(!wl.contains("Z"));

        wl.dequeue_front(VehicleClass::Compact);
        assert!(!wl.contains("B"));
        assert_eq!(wl.position("B"), None);
    }

    #[test]
    fn test_empty_waitlist() {
        let wl = Waitlist::new();
        assert!(wl.is_empty());
        assert!(wl.peek_front(VehicleClass::Compact).is_none());
        assert!(wl.entries().is_empty());
    }
}
