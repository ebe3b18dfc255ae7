//! One feeder thread per symbol nudging a shared price table until a shared
//! stop token is cancelled.
//!
//! Feeders and the reporter check the token and the run deadline at the top
//! of their loop only. A feeder that is asleep when the run ends wakes,
//! applies one last update, then exits, so the final snapshot may include
//! updates made slightly after `duration`. The timer waits in short ticks so
//! an external cancel is seen promptly.

use std::collections::{BTreeMap, BTreeSet};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::FeedConfig;
use crate::error::{EngineError, EngineResult};
use crate::observability::record_feed_update;
use crate::parallel::{Dispatcher, Task};

/// Final prices after a feed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    /// Symbol to price, rounded to 2 decimal places.
    pub prices: BTreeMap<String, f64>,
    /// Number of price updates applied across all symbols.
    pub updates: u64,
}

#[derive(Debug)]
struct FeedState {
    prices: BTreeMap<String, f64>,
    updates: u64,
}

impl FeedState {
    fn snapshot(&self) -> PriceSnapshot {
        PriceSnapshot {
            prices: self
                .prices
                .iter()
                .map(|(symbol, price)| (symbol.clone(), round_cents(*price)))
                .collect(),
            updates: self.updates,
        }
    }
}

/// Longest uninterrupted sleep of the run timer.
const TIMER_TICK: Duration = Duration::from_millis(10);

/// Stop signal for one run: the token, bounded by the run deadline.
#[derive(Debug, Clone)]
struct RunStop {
    cancel: CancellationToken,
    deadline: Instant,
}

impl RunStop {
    fn is_running(&self) -> bool {
        !self.cancel.is_cancelled() && Instant::now() < self.deadline
    }

    /// Sleep until the deadline or a cancel, then cancel the token.
    fn wait(&self) {
        while self.is_running() {
            let left = self.deadline.saturating_duration_since(Instant::now());
            thread::sleep(left.min(TIMER_TICK));
        }
        self.cancel.cancel();
    }
}

enum Role {
    Feed { symbol: String, rng: StdRng },
    Report,
    Stop,
}

/// Runs simulated price feeds for a fixed duration.
#[derive(Debug, Clone)]
pub struct PriceFeedSimulator {
    config: FeedConfig,
    seed: Option<u64>,
    cancel: CancellationToken,
}

impl PriceFeedSimulator {
    /// Create a simulator.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for inverted bounds, a negative or
    /// non-finite step, or a zero report interval.
    pub fn new(config: FeedConfig) -> EngineResult<Self> {
        if config.min_update_ms > config.max_update_ms {
            return Err(EngineError::invalid_input(format!(
                "feed update bounds are inverted: {}ms > {}ms",
                config.min_update_ms, config.max_update_ms
            )));
        }
        if !config.initial_price_low.is_finite()
            || !config.initial_price_high.is_finite()
            || config.initial_price_low > config.initial_price_high
        {
            return Err(EngineError::invalid_input(format!(
                "initial price range [{}, {}] is invalid",
                config.initial_price_low, config.initial_price_high
            )));
        }
        if !config.max_step.is_finite() || config.max_step < 0.0 {
            return Err(EngineError::invalid_input(format!(
                "max step must be finite and non-negative, got {}",
                config.max_step
            )));
        }
        if config.report_interval_ms == 0 {
            return Err(EngineError::invalid_input("report interval must be positive"));
        }
        Ok(Self {
            config,
            seed: None,
            cancel: CancellationToken::new(),
        })
    }

    /// Draw initial prices and feeder randomness from `seed`.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Parent of every run's stop token. Cancelling it ends the current run
    /// once each feeder finishes its current sleep, and makes later runs
    /// return immediately.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the feeds for `duration` and return the final prices.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an empty or duplicated symbol list,
    /// and a computation error if a worker fails.
    pub fn run<T: AsRef<str>>(&self, symbols: &[T], duration: Duration) -> EngineResult<PriceSnapshot> {
        let symbols = validate_symbols(symbols)?;
        let mut rng = self.rng(0);

        let state = FeedState {
            prices: symbols
                .iter()
                .map(|symbol| {
                    let price = rng
                        .random_range(self.config.initial_price_low..=self.config.initial_price_high);
                    (symbol.clone(), price)
                })
                .collect(),
            updates: 0,
        };

        let mut roles: Vec<(String, Role)> = symbols
            .into_iter()
            .enumerate()
            .map(|(index, symbol)| {
                let rng = self.rng(index as u64 + 1);
                (format!("feed-{symbol}"), Role::Feed { symbol, rng })
            })
            .collect();
        // Timer first, so it is running before any feeder is spawned.
        roles.insert(0, ("feed-timer".to_string(), Role::Stop));
        roles.push(("feed-reporter".to_string(), Role::Report));

        info!(
            symbols = roles.len() - 2,
            duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            "Starting price feeds"
        );
        let started = Instant::now();
        let stop = RunStop {
            cancel: self.cancel.child_token(),
            deadline: started
                .checked_add(duration)
                .ok_or_else(|| EngineError::invalid_input("feed duration is too long"))?,
        };

        let tasks: Vec<_> = roles
            .into_iter()
            .map(|(name, role)| {
                let stop = stop.clone();
                let config = &self.config;
                Task::new(name, move |state: &Mutex<FeedState>| {
                    match role {
                        Role::Feed { symbol, rng } => run_feeder(state, &symbol, rng, config, &stop),
                        Role::Report => run_reporter(state, config.report_interval(), &stop),
                        Role::Stop => stop.wait(),
                    }
                    Ok(())
                })
            })
            .collect();

        let state = Dispatcher::new("price_feed").run(state, tasks)?;
        let snapshot = state.snapshot();

        info!(
            updates = snapshot.updates,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Price feeds stopped"
        );
        Ok(snapshot)
    }

    fn rng(&self, stream: u64) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
            None => StdRng::from_os_rng(),
        }
    }
}

fn run_feeder(
    state: &Mutex<FeedState>,
    symbol: &str,
    mut rng: StdRng,
    config: &FeedConfig,
    stop: &RunStop,
) {
    let (min_wait, max_wait) = config.update_bounds();
    while stop.is_running() {
        let wait = if min_wait >= max_wait {
            min_wait
        } else {
            rng.random_range(min_wait..=max_wait)
        };
        thread::sleep(wait);

        let step = rng.random_range(-config.max_step..=config.max_step);
        let mut guard = state.lock();
        if let Some(price) = guard.prices.get_mut(symbol) {
            *price += step;
        }
        guard.updates += 1;
        drop(guard);

        record_feed_update(symbol);
        debug!(symbol, step, "Price updated");
    }
}

fn run_reporter(state: &Mutex<FeedState>, interval: Duration, stop: &RunStop) {
    while stop.is_running() {
        thread::sleep(interval);
        let snapshot = state.lock().snapshot();
        info!(
            prices = ?snapshot.prices,
            updates = snapshot.updates,
            "Price snapshot"
        );
    }
}

fn validate_symbols<T: AsRef<str>>(symbols: &[T]) -> EngineResult<Vec<String>> {
    if symbols.is_empty() {
        return Err(EngineError::invalid_input("symbol list must not be empty"));
    }
    let mut seen = BTreeSet::new();
    symbols
        .iter()
        .map(|symbol| {
            let symbol = symbol.as_ref();
            if symbol.trim().is_empty() {
                return Err(EngineError::invalid_input("symbols must not be blank"));
            }
            if !seen.insert(symbol.to_string()) {
                return Err(EngineError::invalid_input(format!(
                    "duplicate symbol '{symbol}'"
                )));
            }
            Ok(symbol.to_string())
        })
        .collect()
}

fn round_cents(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}
