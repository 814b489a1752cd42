//! Allocation engine: entry, exit, waitlist hand-off and reporting
//!
//! Combines SlotPool + FreeIndex + Waitlist + Directory + BillingPolicy.
//! This is the integration layer that provides the high-level API.
//!
//! Every public operation runs to completion without blocking, so a caller
//! sharing the engine between threads only needs one lock around it.

use super::billing::BillingPolicy;
use super::directory::Directory;
use super::free_index::FreeIndex;
use super::pool::{SlotPool, DEFAULT_MAX_SLOTS};
use super::slot::{Assignment, SlotIndex, TicketId, VehicleId};
use super::vehicle_class::{ClassMap, VehicleClass};
use super::waitlist::Waitlist;
use crate::error::{Error, Result};
use serde::Serialize;
use tracing::{debug, error, info};

/// A vehicle bound to a slot, as reported back to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assigned {
    pub ticket: TicketId,
    pub vehicle: VehicleId,
    pub class: VehicleClass,
    pub slot: SlotIndex,
}

impl From<&Assignment> for Assigned {
    fn from(a: &Assignment) -> Self {
        Self {
            ticket: a.ticket,
            vehicle: a.vehicle.clone(),
            class: a.class,
            slot: a.slot,
        }
    }
}

/// Result of an entry request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntryOutcome {
    /// Got the nearest free slot of its class
    Assigned(Assigned),
    /// No free slot of the class; waiting at `position` (1-based, within class)
    Queued {
        class: VehicleClass,
        position: usize,
    },
    /// Vehicle is already parked; nothing changed
    AlreadyParked { slot: SlotIndex },
    /// Vehicle is already on the waitlist; nothing changed
    AlreadyQueued {
        class: VehicleClass,
        position: usize,
    },
}

/// Billing receipt for a departed vehicle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Receipt {
    pub vehicle: VehicleId,
    pub ticket: TicketId,
    pub class: VehicleClass,
    pub slot: SlotIndex,
    pub elapsed_minutes: i64,
    pub billed_hours: u64,
    pub rate: f64,
    pub fee: f64,
    /// Waitlisted vehicle that received the freed slot, if any
    pub handoff: Option<Assigned>,
}

/// Result of an exit request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExitOutcome {
    Released(Receipt),
    NotParked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OccupiedSlot {
    pub slot: SlotIndex,
    pub class: VehicleClass,
    pub vehicle: VehicleId,
    pub ticket: TicketId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaitingVehicle {
    /// 1-based position in overall arrival order
    pub position: usize,
    pub vehicle: VehicleId,
    pub class: VehicleClass,
}

/// Free counts, occupied slots and the waitlist at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailabilitySnapshot {
    pub free: ClassMap<usize>,
    pub total_free: usize,
    pub occupied: Vec<OccupiedSlot>,
    pub waitlist: Vec<WaitingVehicle>,
}

/// Engine statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub total_slots: usize,
    pub occupied: usize,
    pub occupancy_percent: f64,
    pub total_served: u64,
    pub total_earnings: f64,
    pub rates: ClassMap<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SlotState {
    Free,
    Occupied { vehicle: VehicleId, ticket: TicketId },
}

/// One row of the slot layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotView {
    pub slot: SlotIndex,
    pub class: VehicleClass,
    pub state: SlotState,
}

/// The parking facility
///
/// Owns all allocation state. Counters live here rather than in globals so
/// every engine (and every test) is isolated and `initialize` starts clean.
#[derive(Debug)]
pub struct AllocationEngine {
    pool: SlotPool,
    free: FreeIndex,
    waitlist: Waitlist,
    directory: Directory,
    billing: BillingPolicy,
    last_ticket: u64,
    total_served: u64,
    total_earnings: f64,
    /// Upper bound enforced by `initialize`
    max_slots: usize,
}

impl Default for AllocationEngine {
    fn default() -> Self {
        Self::new(&ClassMap::default())
    }
}

impl AllocationEngine {
    /// Create an engine with default rates
    pub fn new(counts: &ClassMap<u32>) -> Self {
        Self::with_billing(counts, BillingPolicy::default())
    }

    pub fn with_billing(counts: &ClassMap<u32>, billing: BillingPolicy) -> Self {
        let pool = SlotPool::new(counts);
        let free = FreeIndex::from_pool(&pool);
        Self {
            pool,
            free,
            waitlist: Waitlist::new(),
            directory: Directory::new(),
            billing,
            last_ticket: 0,
            total_served: 0,
            total_earnings: 0.0,
            max_slots: DEFAULT_MAX_SLOTS,
        }
    }

    /// Limit the facility size accepted by [`AllocationEngine::initialize`]
    pub fn with_max_slots(mut self, max_slots: usize) -> Self {
        self.max_slots = max_slots;
        self
    }

    /// Rebuild the facility with new slot counts
    ///
    /// Every slot becomes free; parked vehicles, the waitlist, ticket numbering
    /// and totals are discarded. Rates and the size limit are kept. A facility
    /// over the limit is rejected and the current one stays as it was.
    pub fn initialize(&mut self, counts: &ClassMap<u32>) -> Result<()> {
        SlotPool::check_size(counts, self.max_slots)?;

        let billing = std::mem::take(&mut self.billing);
        *self = Self::with_billing(counts, billing).with_max_slots(self.max_slots);
        info!(
            total = self.pool.len(),
            car = counts.car,
            bike = counts.bike,
            truck = counts.truck,
            "Parking initialized"
        );
        Ok(())
    }

    /// Change the hourly rate of a class
    pub fn set_rate(&mut self, class: VehicleClass, rate: f64) -> Result<()> {
        if !rate.is_finite() || rate < 0.0 {
            return Err(Error::InvalidArgument(format!(
                "Rate must be a non-negative number, got {}",
                rate
            )));
        }
        self.billing.set_rate(class, rate);
        info!(class = %class, rate, "Rate updated");
        Ok(())
    }

    pub fn rates(&self) -> ClassMap<f64> {
        *self.billing.rates()
    }

    /// Admit a vehicle: nearest free slot of its class, or the waitlist
    pub fn entry(&mut self, vehicle: VehicleId, class: VehicleClass) -> Result<EntryOutcome> {
        if let Some(slot) = self.directory.lookup(vehicle.as_str()) {
            debug!(vehicle = %vehicle, slot = %slot, "Entry rejected: already parked");
            return Ok(EntryOutcome::AlreadyParked { slot });
        }
        if let Some((class, position)) = self.waitlist.position(vehicle.as_str()) {
            debug!(vehicle = %vehicle, position, "Entry rejected: already waiting");
            return Ok(EntryOutcome::AlreadyQueued { class, position });
        }

        let outcome = match self.free.take(class) {
            Some(index) => EntryOutcome::Assigned(self.bind(vehicle, class, index)?),
            None => {
                let position = self.waitlist.enqueue(vehicle.clone(), class);
                info!(vehicle = %vehicle, class = %class, position, "No free slot, added to waitlist");
                EntryOutcome::Queued { class, position }
            }
        };

        self.debug_check();
        Ok(outcome)
    }

    /// Release a vehicle's slot, bill the stay and serve the waitlist
    ///
    /// `vehicle` is matched the way [`VehicleId::new`] stores it, so
    /// surrounding whitespace is ignored.
    pub fn exit(&mut self, vehicle: &str, elapsed_minutes: i64) -> Result<ExitOutcome> {
        let vehicle = VehicleId::normalize(vehicle);
        let Some(index) = self.directory.lookup(vehicle) else {
            debug!(vehicle, "Exit rejected: not parked");
            return Ok(ExitOutcome::NotParked);
        };

        // Nothing is touched until the slot is known to hold this vehicle
        let holder = self
            .pool
            .slot(index)
            .map_err(|e| Error::InvariantViolation(e.to_string()))?
            .assignment()
            .map(|a| a.vehicle.as_str());
        if holder != Some(vehicle) {
            let holder = holder.unwrap_or("nobody");
            error!(vehicle, slot = %index, holder, "Directory points at another vehicle's slot");
            return Err(Error::InvariantViolation(format!(
                "Directory maps {} to slot {} held by {}",
                vehicle, index, holder
            )));
        }

        let assignment = self.pool.release_slot(index)?;
        self.directory.remove(vehicle)?;

        let elapsed_minutes = elapsed_minutes.max(0);
        let charge = self.billing.fee(assignment.class, elapsed_minutes);
        self.total_earnings += charge.amount;

        info!(
            vehicle,
            slot = %index,
            ticket = %assignment.ticket,
            minutes = elapsed_minutes,
            hours = charge.billed_hours,
            fee = charge.amount,
            "Vehicle exited"
        );

        // The freed slot goes straight to the head of the class queue and is
        // never visible as free while someone of that class is waiting.
        let class = assignment.class;
        let handoff = match self.waitlist.dequeue_front(class) {
            Some(next) => {
                let assigned = self.bind(next.vehicle, class, index)?;
                info!(vehicle = %assigned.vehicle, slot = %index, ticket = %assigned.ticket, "Freed slot handed to waitlisted vehicle");
                Some(assigned)
            }
            None => {
                self.free.put(class, index)?;
                None
            }
        };

        self.debug_check();
        Ok(ExitOutcome::Released(Receipt {
            vehicle: assignment.vehicle,
            ticket: assignment.ticket,
            class,
            slot: index,
            elapsed_minutes,
            billed_hours: charge.billed_hours,
            rate: charge.rate,
            fee: charge.amount,
            handoff,
        }))
    }

    /// Mint a ticket and occupy `index`
    fn bind(&mut self, vehicle: VehicleId, class: VehicleClass, index: SlotIndex) -> Result<Assigned> {
        self.last_ticket += 1;
        let assignment = Assignment {
            ticket: TicketId(self.last_ticket),
            vehicle,
            class,
            slot: index,
        };
        let assigned = Assigned::from(&assignment);

        self.pool.assign(index, assignment)?;
        // The caller has already ruled the vehicle out of the directory
        self.directory
            .register(assigned.vehicle.clone(), index)
            .map_err(|e| {
                error!(vehicle = %assigned.vehicle, slot = %index, error = %e, "Directory out of step with the pool");
                Error::InvariantViolation(e.to_string())
            })?;
        self.total_served += 1;

        debug!(vehicle = %assigned.vehicle, slot = %index, ticket = %assigned.ticket, class = %class, "Slot assigned");
        Ok(assigned)
    }

    /// Current assignment of a parked vehicle
    pub fn parked(&self, vehicle: &str) -> Option<&Assignment> {
        let index = self.directory.lookup(vehicle)?;
        self.pool.slot(index).ok()?.assignment()
    }

    /// Class and 1-based position of a waiting vehicle
    pub fn waiting_position(&self, vehicle: &str) -> Option<(VehicleClass, usize)> {
        self.waitlist.position(vehicle)
    }

    pub fn total_slots(&self) -> usize {
        self.pool.len()
    }

    pub fn free_counts(&self) -> ClassMap<usize> {
        self.free.free_counts()
    }

    pub fn waitlist_sizes(&self) -> ClassMap<usize> {
        ClassMap::from_fn(|class| self.waitlist.size(class))
    }

    pub fn availability(&self) -> AvailabilitySnapshot {
        let occupied = self
            .pool
            .iter()
            .filter_map(|slot| slot.assignment())
            .map(|a| OccupiedSlot {
                slot: a.slot,
                class: a.class,
                vehicle: a.vehicle.clone(),
                ticket: a.ticket,
            })
            .collect();

        let waitlist = self
            .waitlist
            .entries()
            .into_iter()
            .enumerate()
            .map(|(i, entry)| WaitingVehicle {
                position: i + 1,
                vehicle: entry.vehicle.clone(),
                class: entry.class,
            })
            .collect();

        AvailabilitySnapshot {
            free: self.free.free_counts(),
            total_free: self.free.total_free(),
            occupied,
            waitlist,
        }
    }

    pub fn stats(&self) -> StatsSnapshot {
        let total_slots = self.pool.len();
        let occupied = self.pool.occupied_count();
        let occupancy_percent = if total_slots == 0 {
            0.0
        } else {
            100.0 * occupied as f64 / total_slots as f64
        };

        StatsSnapshot {
            total_slots,
            occupied,
            occupancy_percent,
            total_served: self.total_served,
            total_earnings: self.total_earnings,
            rates: self.rates(),
        }
    }

    pub fn layout(&self) -> Vec<SlotView> {
        self.pool
            .iter()
            .map(|slot| SlotView {
                slot: slot.index(),
                class: slot.class(),
                state: match slot.assignment() {
                    Some(a) => SlotState::Occupied {
                        vehicle: a.vehicle.clone(),
                        ticket: a.ticket,
                    },
                    None => SlotState::Free,
                },
            })
            .collect()
    }

    /// Check that pool, free index, directory and waitlist agree
    pub fn verify_invariants(&self) -> Result<()> {
        for slot in self.pool.iter() {
            let index = slot.index();
            let class = slot.class();
            let in_free = self.free.contains(class, index);

            match slot.assignment() {
                Some(a) => {
                    if in_free {
                        return Err(Error::InvariantViolation(format!(
                            "Occupied slot {} is in the free index",
                            index
                        )));
                    }
                    if a.slot != index || a.class != class {
                        return Err(Error::InvariantViolation(format!(
                            "Slot {} holds assignment {} for {} slot {}",
                            index, a.ticket, a.class, a.slot
                        )));
                    }
                    if self.directory.lookup(a.vehicle.as_str()) != Some(index) {
                        return Err(Error::InvariantViolation(format!(
                            "Directory does not map {} to slot {}",
                            a.vehicle, index
                        )));
                    }
                }
                None if !in_free => {
                    return Err(Error::InvariantViolation(format!(
                        "Free slot {} missing from the free index",
                        index
                    )));
                }
                None => {}
            }
        }

        for class in VehicleClass::ALL {
            for index in self.free.iter(class) {
                let slot = self.pool.slot(index).map_err(|_| {
                    Error::InvariantViolation(format!("Free index holds unknown slot {}", index))
                })?;
                if slot.class() != class || slot.is_occupied() {
                    return Err(Error::InvariantViolation(format!(
                        "Free index for {} holds slot {} ({}, occupied={})",
                        class,
                        index,
                        slot.class(),
                        slot.is_occupied()
                    )));
                }
            }

            if self.waitlist.size(class) > 0 && self.free.free_count(class) > 0 {
                return Err(Error::InvariantViolation(format!(
                    "{} vehicles waiting while {} slots are free",
                    class,
                    class
                )));
            }
        }

        if self.directory.len() != self.pool.occupied_count() {
            return Err(Error::InvariantViolation(format!(
                "Directory has {} vehicles but {} slots are occupied",
                self.directory.len(),
                self.pool.occupied_count()
            )));
        }

        for entry in self.waitlist.entries() {
            if self.directory.lookup(entry.vehicle.as_str()).is_some() {
                return Err(Error::InvariantViolation(format!(
                    "{} is both parked and waiting",
                    entry.vehicle
                )));
            }
        }

        Ok(())
    }

    #[inline]
    fn debug_check(&self) {
        #[cfg(debug_assertions)]
        if let Err(e) = self.verify_invariants() {
            error!(error = %e, "Allocation state inconsistent");
            panic!("{}", e);
        }
    }
}
