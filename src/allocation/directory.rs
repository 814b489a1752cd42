//! Vehicle → slot directory

use super::slot::{SlotIndex, VehicleId};
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Maps each parked vehicle to the slot it occupies
///
/// A vehicle appears here exactly while some slot holds its assignment,
/// so it can never be bound to two slots at once.
#[derive(Debug, Default)]
pub struct Directory {
    index: HashMap<VehicleId, SlotIndex>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `vehicle` as parked in `slot`
    pub fn register(&mut self, vehicle: VehicleId, slot: SlotIndex) -> Result<()> {
        if let Some(existing) = self.index.get(&vehicle) {
            return Err(Error::DuplicateVehicle(format!(
                "{} already holds slot {}",
                vehicle, existing
            )));
        }
        self.index.insert(vehicle, slot);
        Ok(())
    }

    /// Get slot for a vehicle; `vehicle` is normalized like [`VehicleId::new`]
    pub fn lookup(&self, vehicle: &str) -> Option<SlotIndex> {
        self.index.get(VehicleId::normalize(vehicle)).copied()
    }

    /// Forget a vehicle, returning the slot it held
    pub fn remove(&mut self, vehicle: &str) -> Result<SlotIndex> {
        self.index
            .remove(VehicleId::normalize(vehicle))
            .ok_or_else(|| Error::NotFound(format!("Vehicle {} is not parked", vehicle)))
    }

    /// Get number of parked vehicles
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
