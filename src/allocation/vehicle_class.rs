//! Vehicle classes and per-class tables

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// Kind of vehicle a slot accepts
///
/// A slot's class is fixed when the pool is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VehicleClass {
    #[serde(rename = "car")]
    Compact,
    #[serde(rename = "bike")]
    TwoWheeler,
    #[serde(rename = "truck")]
    HeavyGoods,
}

impl VehicleClass {
    /// All classes, in the order their slots are laid out in the pool
    pub const ALL: [VehicleClass; 3] = [
        VehicleClass::Compact,
        VehicleClass::TwoWheeler,
        VehicleClass::HeavyGoods,
    ];

    /// Lowercase token used in config files and on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleClass::Compact => "car",
            VehicleClass::TwoWheeler => "bike",
            VehicleClass::HeavyGoods => "truck",
        }
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VehicleClass::Compact => "CAR",
            VehicleClass::TwoWheeler => "BIKE",
            VehicleClass::HeavyGoods => "TRUCK",
        };
        f.write_str(name)
    }
}

impl FromStr for VehicleClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "car" | "c" => Ok(VehicleClass::Compact),
            "bike" | "b" => Ok(VehicleClass::TwoWheeler),
            "truck" | "t" => Ok(VehicleClass::HeavyGoods),
            other => Err(Error::InvalidArgument(format!(
                "Unknown vehicle class '{}' (expected car, bike or truck)",
                other
            ))),
        }
    }
}

/// One value per vehicle class
///
/// Replaces three parallel fields with a single table indexed by class,
/// so per-class logic is written once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassMap<T> {
    pub car: T,
    pub bike: T,
    pub truck: T,
}

impl<T> ClassMap<T> {
    pub fn new(car: T, bike: T, truck: T) -> Self {
        Self { car, bike, truck }
    }

    /// Build a table by evaluating `f` for every class
    pub fn from_fn(mut f: impl FnMut(VehicleClass) -> T) -> Self {
        Self {
            car: f(VehicleClass::Compact),
            bike: f(VehicleClass::TwoWheeler),
            truck: f(VehicleClass::HeavyGoods),
        }
    }

    /// Iterate `(class, &value)` pairs in layout order
    pub fn iter(&self) -> impl Iterator<Item = (VehicleClass, &T)> {
        VehicleClass::ALL.into_iter().map(move |class| (class, &self[class]))
    }

    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> ClassMap<U> {
        ClassMap::from_fn(|class| f(&self[class]))
    }
}

impl<T> Index<VehicleClass> for ClassMap<T> {
    type Output = T;

    fn index(&self, class: VehicleClass) -> &T {
        match class {
            VehicleClass::Compact => &self.car,
            VehicleClass::TwoWheeler => &self.bike,
            VehicleClass::HeavyGoods => &self.truck,
        }
    }
}

impl<T> IndexMut<VehicleClass> for ClassMap<T> {
    fn index_mut(&mut self, class: VehicleClass) -> &mut T {
        match class {
            VehicleClass::Compact => &mut self.car,
            VehicleClass::TwoWheeler => &mut self.bike,
            VehicleClass::HeavyGoods => &mut self.truck,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_class_tokens() -> Result<()> {
        assert_eq!("car".parse::<VehicleClass>()?, VehicleClass::Compact);
        assert_eq!("C".parse::<VehicleClass>()?, VehicleClass::Compact);
        assert_eq!(" Bike ".parse::<VehicleClass>()?, VehicleClass::TwoWheeler);
        assert_eq!("TRUCK".parse::<VehicleClass>()?, VehicleClass::HeavyGoods);
        assert_eq!("t".parse::<VehicleClass>()?, VehicleClass::HeavyGoods);
        Ok(())
    }

    #[test]
    fn test_unknown_class_rejected() {
        // Unknown tokens must not silently become trucks
        assert!(matches!(
            "bus".parse::<VehicleClass>(),
            Err(Error::InvalidArgument(_))
        ));
        assert!("".parse::<VehicleClass>().is_err());
    }

    #[test]
    fn test_display_and_serde_names() {
        assert_eq!(VehicleClass::TwoWheeler.to_string(), "BIKE");
        assert_eq!(VehicleClass::HeavyGoods.as_str(), "truck");
        let json = serde_json::to_string(&VehicleClass::Compact).unwrap();
        assert_eq!(json, "\"car\"");
    }

    #[test]
    fn test_class_map_indexing() {
        let mut counts = ClassMap::new(3u32, 0, 1);
        counts[VehicleClass::TwoWheeler] += 2;

        assert_eq!(counts[VehicleClass::Compact], 3);
        assert_eq!(counts[VehicleClass::TwoWheeler], 2);
        assert_eq!(counts.truck, 1);

        let classes: Vec<_> = counts.iter().map(|(class, _)| class).collect();
        assert_eq!(classes, VehicleClass::ALL.to_vec());

        let doubled = counts.map(|n| n * 2);
        assert_eq!(doubled, ClassMap::new(6, 4, 2));
    }
}
