//! Worker pool sizing for the partitioned numeric helpers.

use serde::{Deserialize, Serialize};

/// Executor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Worker threads per dispatch. Never auto-detected from hardware.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Window size for moving averages and rolling volatility.
    #[serde(default = "default_window")]
    pub window: usize,
    /// Degrees-of-freedom adjustment for rolling standard deviation.
    #[serde(default)]
    pub ddof: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            window: default_window(),
            ddof: 0,
        }
    }
}

const fn default_workers() -> usize {
    4
}

const fn default_window() -> usize {
    20
}
