use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::MonitorConfig;
use crate::error::{EngineError, EngineResult};
use crate::observability::record_monitor_trigger;
use crate::parallel::{Dispatcher, Task};

/// Source of prices for watched items.
pub trait PriceSampler: Send + Sync {
    /// Current price of `item`.
    fn sample(&self, item: &str) -> f64;
}

/// Samples every item uniformly from `[low, high]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformSampler {
    low: f64,
    high: f64,
}

impl UniformSampler {
    /// Create a sampler over the closed interval `[low, high]`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if either bound is not finite or
    /// `low > high`.
    pub fn new(low: f64, high: f64) -> EngineResult<Self> {
        if !low.is_finite() || !high.is_finite() || low > high {
            return Err(EngineError::invalid_input(format!(
                "sampler bounds must be finite with low <= high, got [{low}, {high}]"
            )));
        }
        Ok(Self { low, high })
    }

    /// Sampler using the price range from `config`.
    ///
    /// # Errors
    ///
    /// Same as [`UniformSampler::new`].
    pub fn from_config(config: &MonitorConfig) -> EngineResult<Self> {
        Self::new(config.price_low, config.price_high)
    }
}

impl PriceSampler for UniformSampler {
    fn sample(&self, _item: &str) -> f64 {
        rand::rng().random_range(self.low..=self.high)
    }
}

/// Whether `target` lies in the closed interval spanned by two samples.
#[must_use]
pub fn crossed(before: f64, after: f64, target: f64) -> bool {
    before.min(after) <= target && target <= before.max(after)
}

/// One watcher's samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Watched item.
    pub item: String,
    /// First sample.
    pub before: f64,
    /// Second sample.
    pub after: f64,
}

impl Observation {
    /// Whether this observation crossed `target`.
    #[must_use]
    pub fn crossed(&self, target: f64) -> bool {
        crossed(self.before, self.after, target)
    }
}

/// Watches items concurrently for a target crossing.
#[derive(Debug, Clone)]
pub struct RangeCrossMonitor<S> {
    config: MonitorConfig,
    sampler: S,
}

impl<S: PriceSampler> RangeCrossMonitor<S> {
    /// Create a monitor.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the delay bounds are inverted.
    pub fn new(config: MonitorConfig, sampler: S) -> EngineResult<Self> {
        if config.min_delay_ms > config.max_delay_ms {
            return Err(EngineError::invalid_input(format!(
                "monitor delay bounds are inverted: {}ms > {}ms",
                config.min_delay_ms, config.max_delay_ms
            )));
        }
        Ok(Self { config, sampler })
    }

    /// Items whose sampled interval contains `target`, in trigger order.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `target` is not finite, and a
    /// computation error if a watcher fails.
    pub fn watch<T: AsRef<str>>(&self, items: &[T], target: f64) -> EngineResult<Vec<String>> {
        if !target.is_finite() {
            return Err(EngineError::invalid_input(format!(
                "target must be finite, got {target}"
            )));
        }

        let started = Instant::now();
        let (min_delay, max_delay) = self.config.delay_bounds();
        let sampler = &self.sampler;

        let tasks: Vec<_> = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let item = item.as_ref().to_string();
                Task::new(format!("watch-{index}"), move |hits: &Mutex<Vec<String>>| {
                    let observation = observe(sampler, item, min_delay, max_delay);
                    let triggered = observation.crossed(target);
                    debug!(
                        item = %observation.item,
                        before = observation.before,
                        after = observation.after,
                        triggered,
                        "Observation complete"
                    );
                    if triggered {
                        hits.lock().push(observation.item);
                        record_monitor_trigger();
                    }
                    Ok(())
                })
            })
            .collect();

        let hits = Dispatcher::new("range_monitor").run(Vec::new(), tasks)?;
        info!(
            watched = items.len(),
            triggered = hits.len(),
            target,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Range monitor finished"
        );
        Ok(hits)
    }
}

fn observe<S: PriceSampler + ?Sized>(
    sampler: &S,
    item: String,
    min_delay: Duration,
    max_delay: Duration,
) -> Observation {
    thread::sleep(random_delay(min_delay, max_delay));
    let before = sampler.sample(&item);
    thread::sleep(random_delay(min_delay, max_delay));
    let after = sampler.sample(&item);
    Observation {
        item,
        before,
        after,
    }
}

fn random_delay(min: Duration, max: Duration) -> Duration {
    if min >= max {
        return min;
    }
    rand::rng().random_range(min..=max)
}
