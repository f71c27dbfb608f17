//! Jar Configuration

use std::time::Duration;

/// Cookie jar configuration
#[derive(Debug, Clone)]
pub struct JarConfig {
    /// How often the sweeper ages and evicts cookies
    pub sweep_interval: Duration,

    /// Remaining lifetime at which the near-expiry hook fires
    pub near_expiry_threshold: Duration,
}

impl Default for JarConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(1),
            near_expiry_threshold: Duration::from_secs(60),
        }
    }
}

impl JarConfig {
    /// Set sweep interval
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Set near-expiry threshold
    pub fn with_near_expiry_threshold(mut self, threshold: Duration) -> Self {
        self.near_expiry_threshold = threshold;
        self
    }
}
