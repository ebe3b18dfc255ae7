//! Range-crossing monitor sampling parameters.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Monitor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Shortest wait before each sample, in milliseconds.
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,
    /// Longest wait before each sample, in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Lower bound of the default uniform price sampler.
    #[serde(default = "default_price_low")]
    pub price_low: f64,
    /// Upper bound of the default uniform price sampler.
    #[serde(default = "default_price_high")]
    pub price_high: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            price_low: default_price_low(),
            price_high: default_price_high(),
        }
    }
}

impl MonitorConfig {
    /// Delay bounds as durations.
    #[must_use]
    pub const fn delay_bounds(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.min_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }
}

const fn default_min_delay_ms() -> u64 {
    100
}

const fn default_max_delay_ms() -> u64 {
    500
}

const fn default_price_low() -> f64 {
    80.0
}

const fn default_price_high() -> f64 {
    120.0
}
