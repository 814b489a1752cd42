//! Slots, tickets and vehicle identifiers

use super::vehicle_class::VehicleClass;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Internal 0-based position of a slot in the pool
///
/// Users see 1-based slot numbers; convert with [`SlotIndex::number`]
/// and [`SlotIndex::from_number`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotIndex(pub usize);

impl SlotIndex {
    /// 1-based slot number for display
    pub fn number(&self) -> usize {
        self.0 + 1
    }

    /// Convert a user-facing 1-based slot number
    pub fn from_number(number: usize) -> Result<Self> {
        number
            .checked_sub(1)
            .map(SlotIndex)
            .ok_or_else(|| Error::InvalidArgument("Slot numbers start at 1".to_string()))
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.number())
    }
}

/// Ticket number, increasing for the lifetime of an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub u64);

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// Registration or other caller-chosen vehicle identifier (never empty)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VehicleId(String);

impl VehicleId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let trimmed = Self::normalize(&id);
        if trimmed.is_empty() {
            return Err(Error::InvalidArgument(
                "Vehicle ID must not be empty".to_string(),
            ));
        }
        if trimmed.len() == id.len() {
            Ok(Self(id))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    /// Lookup form of a raw identifier; matches what `new` stores
    pub fn normalize(raw: &str) -> &str {
        raw.trim()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for VehicleId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<VehicleId> for String {
    fn from(id: VehicleId) -> Self {
        id.0
    }
}

impl Borrow<str> for VehicleId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A live binding of one vehicle to one slot (the parking ticket)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub ticket: TicketId,
    pub vehicle: VehicleId,
    pub class: VehicleClass,
    pub slot: SlotIndex,
}

/// One parking slot
///
/// Occupied exactly when it holds an assignment.
#[derive(Debug, Clone)]
pub struct Slot {
    index: SlotIndex,
    class: VehicleClass,
    assignment: Option<Assignment>,
}

impl Slot {
    /// Create a new free slot
    pub fn new(index: SlotIndex, class: VehicleClass) -> Self {
        Self {
            index,
            class,
            assignment: None,
        }
    }

    pub fn index(&self) -> SlotIndex {
        self.index
    }

    pub fn class(&self) -> VehicleClass {
        self.class
    }

    pub fn is_occupied(&self) -> bool {
        self.assignment.is_some()
    }

    pub fn assignment(&self) -> Option<&Assignment> {
        self.assignment.as_ref()
    }

    /// Occupy this slot
    pub fn assign(&mut self, assignment: Assignment) -> Result<()> {
        if let Some(current) = &self.assignment {
            return Err(Error::InvariantViolation(format!(
                "Slot {} already occupied by {} ({})",
                self.index, current.vehicle, current.ticket
            )));
        }
        if assignment.class != self.class || assignment.slot != self.index {
            return Err(Error::InvariantViolation(format!(
                "Assignment {} for {} slot {} does not fit {} slot {}",
                assignment.ticket, assignment.class, assignment.slot, self.class, self.index
            )));
        }
        self.assignment = Some(assignment);
        Ok(())
    }

    /// Free this slot, returning the assignment it held
    pub fn release(&mut self) -> Result<Assignment> {
        self.assignment.take().ok_or_else(|| {
            Error::InvariantViolation(format!("Slot {} released while already free", self.index))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(n: u64, vehicle: &str, slot: usize) -> Assignment {
        Assignment {
            ticket: TicketId(n),
            vehicle: VehicleId::new(vehicle).unwrap(),
            class: VehicleClass::Compact,
            slot: SlotIndex(slot),
        }
    }

    #[test]
    fn test_slot_numbering() -> Result<()> {
        assert_eq!(SlotIndex(0).number(), 1);
        assert_eq!(SlotIndex::from_number(7)?, SlotIndex(6));
        assert!(SlotIndex::from_number(0).is_err());
        assert_eq!(SlotIndex(4).to_string(), "#5");
        Ok(())
    }

    #[test]
    fn test_ticket_display() {
        assert_eq!(TicketId(1).to_string(), "T1");
        assert_eq!(TicketId(42).to_string(), "T42");
    }

    #[test]
    fn test_vehicle_id_validation() -> Result<()> {
        assert_eq!(VehicleId::new("  KA-01  ")?.as_str(), "KA-01");
        assert_eq!(VehicleId::normalize("\tKA-01 "), "KA-01");
        assert!(VehicleId::new("").is_err());
        assert!(VehicleId::new("   ").is_err());

        let parsed: std::result::Result<VehicleId, _> = serde_json::from_str("\"\"");
        assert!(parsed.is_err());
        Ok(())
    }

    #[test]
    fn test_slot_lifecycle() -> Result<()> {
        let mut slot = Slot::new(SlotIndex(0), VehicleClass::Compact);
        assert!(!slot.is_occupied());

        slot.assign(ticket(1, "KA-01", 0))?;
        assert!(slot.is_occupied());
        assert_eq!(slot.assignment().map(|a| a.ticket), Some(TicketId(1)));

        let released = slot.release()?;
        assert_eq!(released.vehicle.as_str(), "KA-01");
        assert!(!slot.is_occupied());
        Ok(())
    }

    #[test]
    fn test_double_assign_is_violation() -> Result<()> {
        let mut slot = Slot::new(SlotIndex(0), VehicleClass::Compact);
        slot.assign(ticket(1, "KA-01", 0))?;

        let err = slot.assign(ticket(2, "KA-02", 0)).unwrap_err();
        assert!(matches!(err, Error::InvariantViolation(_)));
        // Original holder is untouched
        assert_eq!(slot.assignment().map(|a| a.ticket), Some(TicketId(1)));
        Ok(())
    }

    #[test]
    fn test_release_free_slot_is_violation() {
        let mut slot = Slot::new(SlotIndex(3), VehicleClass::HeavyGoods);
        assert!(matches!(slot.release(), Err(Error::InvariantViolation(_))));
    }

    #[test]
    fn test_wrong_class_assignment_rejected() {
        let mut slot = Slot::new(SlotIndex(0), VehicleClass::TwoWheeler);
        assert!(slot.assign(ticket(1, "KA-01", 0)).is_err());
        assert!(!slot.is_occupied());
    }
}
