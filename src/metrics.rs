//! Prometheus metrics for the parking service
//!
//! Engine state stays owned by the engine; these series are fed by the
//! service layer after each operation.

use crate::allocation::{AllocationEngine, EntryOutcome, Receipt, VehicleClass};
use prometheus::{Encoder, Gauge, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};
use tracing::{error, info};

lazy_static::lazy_static! {
    /// Global metrics registry
    pub static ref METRICS_REGISTRY: Registry = Registry::new();

    pub static ref ENTRIES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("parklot_entries_total", "Entry requests by class and outcome"),
        &["class", "outcome"]
    ).unwrap();

    pub static ref EXITS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("parklot_exits_total", "Completed exits by class"),
        &["class"]
    ).unwrap();

    pub static ref HANDOFFS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("parklot_handoffs_total", "Freed slots handed directly to a waiting vehicle"),
        &["class"]
    ).unwrap();

    pub static ref FREE_SLOTS: IntGaugeVec = IntGaugeVec::new(
        Opts::new("parklot_free_slots", "Free slots by class"),
        &["class"]
    ).unwrap();

    pub static ref WAITLIST_DEPTH: IntGaugeVec = IntGaugeVec::new(
        Opts::new("parklot_waitlist_depth", "Vehicles waiting by class"),
        &["class"]
    ).unwrap();

    pub static ref EARNINGS_TOTAL: Gauge = Gauge::new(
        "parklot_earnings_total",
        "Total fees billed since the facility was initialized"
    ).unwrap();
}

/// Register all metrics with the global registry (idempotent)
pub fn init_metrics() {
    info!("Initializing Prometheus metrics");

    METRICS_REGISTRY.register(Box::new(ENTRIES_TOTAL.clone())).ok();
    METRICS_REGISTRY.register(Box::new(EXITS_TOTAL.clone())).ok();
    METRICS_REGISTRY.register(Box::new(HANDOFFS_TOTAL.clone())).ok();
    METRICS_REGISTRY.register(Box::new(FREE_SLOTS.clone())).ok();
    METRICS_REGISTRY.register(Box::new(WAITLIST_DEPTH.clone())).ok();
    METRICS_REGISTRY.register(Box::new(EARNINGS_TOTAL.clone())).ok();
}

pub fn record_entry(class: VehicleClass, outcome: &EntryOutcome) {
    let label = match outcome {
        EntryOutcome::Assigned(_) => "assigned",
        EntryOutcome::Queued { .. } => "queued",
        EntryOutcome::AlreadyParked { .. } => "already_parked",
        EntryOutcome::AlreadyQueued { .. } => "already_queued",
    };
    ENTRIES_TOTAL.with_label_values(&[class.as_str(), label]).inc();
}

pub fn record_exit(receipt: &Receipt) {
    EXITS_TOTAL.with_label_values(&[receipt.class.as_str()]).inc();
    if receipt.handoff.is_some() {
        HANDOFFS_TOTAL.with_label_values(&[receipt.class.as_str()]).inc();
    }
}

/// Refresh gauges from the engine's current state
pub fn update_gauges(engine: &AllocationEngine) {
    let free = engine.free_counts();
    let waiting = engine.waitlist_sizes();
    for class in VehicleClass::ALL {
        FREE_SLOTS
            .with_label_values(&[class.as_str()])
            .set(free[class] as i64);
        WAITLIST_DEPTH
            .with_label_values(&[class.as_str()])
            .set(waiting[class] as i64);
    }
    EARNINGS_TOTAL.set(engine.stats().total_earnings);
}

/// Export all metrics in Prometheus text format
pub fn export_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|_| String::from("# Error converting metrics\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::{ClassMap, VehicleId};

    #[test]
    fn test_metrics_export() -> crate::error::Result<()> {
        init_metrics();
        init_metrics();

        let mut engine = AllocationEngine::new(&ClassMap::new(1, 0, 0));
        let outcome = engine.entry(VehicleId::new("M-1")?, VehicleClass::Compact)?;
        record_entry(VehicleClass::Compact, &outcome);
        update_gauges(&engine);

        let text = export_metrics();
        assert!(text.contains("parklot_entries_total"));
        assert!(text.contains("parklot_free_slots"));
        Ok(())
    }
}
