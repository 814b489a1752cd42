//! Slot Allocation Engine
//!
//! Manages a fixed pool of parking slots partitioned by vehicle class.
//! Arrivals take the lowest-numbered free slot of their class; when a class
//! is full they wait in a per-class FIFO queue.
//!
//! # Architecture
//!
//! ```text
//! AllocationEngine
//!   ├─→ SlotPool        → [0:CAR occ] [1:CAR free] [2:BIKE occ] [3:TRUCK free]
//!   ├─→ FreeIndex
//!   │     ├─→ CAR   → {1}
//!   │     ├─→ BIKE  → {}
//!   │     └─→ TRUCK → {3}
//!   ├─→ Waitlist
//!   │     └─→ BIKE  → [KA-09, KA-12]
//!   ├─→ Directory  (vehicle → slot)
//!   │     └─→ KA-01 → 0
//!   │     └─→ KA-05 → 2
//!   └─→ BillingPolicy (CAR=50/h, BIKE=20/h, TRUCK=100/h)
//! ```
//!
//! On exit a freed slot is handed straight to the head of its class's
//! waitlist; it only returns to the free index when nobody is waiting.

pub mod billing;
pub mod directory;
pub mod engine;
pub mod free_index;
pub mod pool;
pub mod slot;
pub mod vehicle_class;
pub mod waitlist;

pub use billing::{BillingPolicy, Charge, DEFAULT_RATES};
pub use directory::Directory;
pub use engine::{
    AllocationEngine, Assigned, AvailabilitySnapshot, EntryOutcome, ExitOutcome, OccupiedSlot,
    Receipt, SlotState, SlotView, StatsSnapshot, WaitingVehicle,
};
pub use free_index::FreeIndex;
pub use pool::SlotPool;
pub use slot::{Assignment, Slot, SlotIndex, TicketId, VehicleId};
pub use vehicle_class::{ClassMap, VehicleClass};
pub use waitlist::{WaitEntry, Waitlist};
