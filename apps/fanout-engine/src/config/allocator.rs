//! Bounded-capacity risk allocator timing.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Allocator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocatorConfig {
    /// Sleep between polls of the shared pool, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Shared deadline for every request, in milliseconds from dispatch.
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            deadline_ms: default_deadline_ms(),
        }
    }
}

impl AllocatorConfig {
    /// Poll backoff as a [`Duration`].
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Shared deadline as a [`Duration`].
    #[must_use]
    pub const fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    /// Same timing with a different deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline_ms = deadline.as_millis() as u64;
        self
    }
}

const fn default_poll_interval_ms() -> u64 {
    100
}

const fn default_deadline_ms() -> u64 {
    2_000
}
