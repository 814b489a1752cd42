// Parklot - Rust Implementation
// A typed parking slot allocator with waitlist hand-off and hourly billing

#![warn(rust_2018_idioms)]

pub mod allocation;
pub mod config;
pub mod metrics;
pub mod server;
pub mod shell;

// Re-exports for convenience
pub use allocation::{
    AllocationEngine, EntryOutcome, ExitOutcome, Receipt, SlotIndex, TicketId, VehicleClass,
    VehicleId,
};
pub use config::LotConfig;

/// Parklot error types
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq)]
    pub enum Error {
        #[error("Duplicate vehicle: {0}")]
        DuplicateVehicle(String),

        #[error("Not found: {0}")]
        NotFound(String),

        /// Internal bookkeeping disagreed with itself. Never expected at runtime.
        #[error("Invariant violation: {0}")]
        InvariantViolation(String),

        #[error("Invalid argument: {0}")]
        InvalidArgument(String),

        #[error("Configuration error: {0}")]
        Config(String),

        #[error("Internal error: {0}")]
        Internal(String),
    }

    impl Error {
        /// True for failures that mean the engine's own data structures are broken.
        pub fn is_fatal(&self) -> bool {
            matches!(self, Error::InvariantViolation(_) | Error::Internal(_))
        }
    }

    pub type Result<T> = std::result::Result<T, Error>;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::error::Error;

    #[test]
    fn test_invariant_violation_is_fatal() {
        assert!(Error::InvariantViolation("slot 3 already free".into()).is_fatal());
        assert!(!Error::DuplicateVehicle("KA-01".into()).is_fatal());
        assert!(!Error::InvalidArgument("rate".into()).is_fatal());
    }
}
