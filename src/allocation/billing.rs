//! Hourly billing

use super::vehicle_class::{ClassMap, VehicleClass};
use serde::{Deserialize, Serialize};

/// Rates per hour used when nothing else is configured
pub const DEFAULT_RATES: ClassMap<f64> = ClassMap {
    car: 50.0,
    bike: 20.0,
    truck: 100.0,
};

const MINUTES_PER_HOUR: u64 = 60;

/// Result of billing one stay
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Charge {
    pub billed_hours: u64,
    pub rate: f64,
    pub amount: f64,
}

/// Per-class hourly rates and the fee rule
///
/// Every started hour is billed, and at least one hour is always billed:
/// 0 min → 1 h, 60 min → 1 h, 61 min → 2 h.
#[derive(Debug, Clone, PartialEq)]
pub struct BillingPolicy {
    rates: ClassMap<f64>,
}

impl Default for BillingPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RATES)
    }
}

impl BillingPolicy {
    pub fn new(rates: ClassMap<f64>) -> Self {
        Self { rates }
    }

    pub fn rate(&self, class: VehicleClass) -> f64 {
        self.rates[class]
    }

    pub fn rates(&self) -> &ClassMap<f64> {
        &self.rates
    }

    /// Callers validate `rate` before it gets here
    pub fn set_rate(&mut self, class: VehicleClass, rate: f64) {
        debug_assert!(rate >= 0.0, "negative rate reached BillingPolicy");
        self.rates[class] = rate;
    }

    /// Hours billed for a stay; negative durations count as zero
    pub fn billed_hours(elapsed_minutes: i64) -> u64 {
        let minutes = elapsed_minutes.max(0) as u64;
        minutes.div_ceil(MINUTES_PER_HOUR).max(1)
    }

    pub fn fee(&self, class: VehicleClass, elapsed_minutes: i64) -> Charge {
        let billed_hours = Self::billed_hours(elapsed_minutes);
        let rate = self.rate(class);
        Charge {
            billed_hours,
            rate,
            amount: billed_hours as f64 * rate,
        }
    }
}
