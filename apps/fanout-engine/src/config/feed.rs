//! Simulated price feed timing and price ranges.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Price feed simulator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Shortest sleep between updates of one symbol, in milliseconds.
    #[serde(default = "default_min_update_ms")]
    pub min_update_ms: u64,
    /// Longest sleep between updates of one symbol, in milliseconds.
    #[serde(default = "default_max_update_ms")]
    pub max_update_ms: u64,
    /// Interval between logged snapshots, in milliseconds.
    #[serde(default = "default_report_interval_ms")]
    pub report_interval_ms: u64,
    /// Lower bound of the initial price draw.
    #[serde(default = "default_initial_price_low")]
    pub initial_price_low: f64,
    /// Upper bound of the initial price draw.
    #[serde(default = "default_initial_price_high")]
    pub initial_price_high: f64,
    /// Largest absolute price change per update.
    #[serde(default = "default_max_step")]
    pub max_step: f64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            min_update_ms: default_min_update_ms(),
            max_update_ms: default_max_update_ms(),
            report_interval_ms: default_report_interval_ms(),
            initial_price_low: default_initial_price_low(),
            initial_price_high: default_initial_price_high(),
            max_step: default_max_step(),
        }
    }
}

impl FeedConfig {
    /// Update interval bounds as durations.
    #[must_use]
    pub const fn update_bounds(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.min_update_ms),
            Duration::from_millis(self.max_update_ms),
        )
    }

    /// Snapshot interval as a duration.
    #[must_use]
    pub const fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }
}

const fn default_min_update_ms() -> u64 {
    1_000
}

const fn default_max_update_ms() -> u64 {
    3_000
}

const fn default_report_interval_ms() -> u64 {
    5_000
}

const fn default_initial_price_low() -> f64 {
    50.0
}

const fn default_initial_price_high() -> f64 {
    150.0
}

const fn default_max_step() -> f64 {
    5.0
}
