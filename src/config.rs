//! Facility configuration
//!
//! Layered the usual way: built-in defaults, then an optional TOML file,
//! then `PARKLOT__*` environment variables, e.g.
//!
//! ```text
//! PARKLOT__SLOTS__CAR=40
//! PARKLOT__RATES__TRUCK=120.5
//! PARKLOT__MAX_SLOTS=500000
//! PARKLOT__SERVER__HTTP_PORT=9090
//! ```

use crate::allocation::pool::DEFAULT_MAX_SLOTS;
use crate::allocation::{AllocationEngine, BillingPolicy, ClassMap, SlotPool, DEFAULT_RATES};
use crate::error::{Error, Result};
use crate::server::ServerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "PARKLOT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LotConfig {
    /// Number of slots of each class
    pub slots: ClassMap<u32>,
    /// Hourly rate of each class
    pub rates: ClassMap<f64>,
    /// Largest facility `slots` or a later re-initialization may describe
    pub max_slots: usize,
    pub server: ServerConfig,
}

impl Default for LotConfig {
    fn default() -> Self {
        Self {
            slots: ClassMap::default(),
            rates: DEFAULT_RATES,
            max_slots: DEFAULT_MAX_SLOTS,
            server: ServerConfig::default(),
        }
    }
}

impl LotConfig {
    /// Load defaults, then `path` (if given), then the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = config::Config::try_from(&LotConfig::default())
            .map_err(|e| Error::Config(format!("Failed to encode defaults: {}", e)))?;

        let mut builder = config::Config::builder().add_source(defaults);
        if let Some(path) = path {
            info!(path = ?path, "Loading configuration file");
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let cfg: LotConfig = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| Error::Config(e.to_string()))?;

        cfg.validate()?;
        debug!(?cfg, "Configuration loaded");
        Ok(cfg)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to render TOML: {}", e)))
    }

    pub fn validate(&self) -> Result<()> {
        SlotPool::check_size(&self.slots, self.max_slots)
            .map_err(|e| Error::Config(format!("[slots] {}", e)))?;
        for (class, &rate) in self.rates.iter() {
            if !rate.is_finite() || rate < 0.0 {
                return Err(Error::Config(format!(
                    "Rate for {} must be a non-negative number, got {}",
                    class, rate
                )));
            }
        }
        Ok(())
    }

    /// Build an engine with these slot counts and rates
    pub fn build_engine(&self) -> AllocationEngine {
        AllocationEngine::with_billing(&self.slots, BillingPolicy::new(self.rates))
            .with_max_slots(self.max_slots)
    }
}
