//! Polling allocator over a lock-protected risk pool.

use std::collections::{BTreeMap, BTreeSet};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::AllocatorConfig;
use crate::error::{EngineError, EngineResult};
use crate::observability::record_allocation;
use crate::parallel::{Dispatcher, Task};

/// Lifecycle of one allocation request.
///
/// `Pending` moves to exactly one terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationStatus {
    /// Still polling.
    Pending,
    /// Capacity was reserved.
    Granted,
    /// The deadline passed (or the run was cancelled) first.
    TimedOut,
}

impl AllocationStatus {
    /// Whether no further transition can happen.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Metrics label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Granted => "granted",
            Self::TimedOut => "timed_out",
        }
    }
}

/// A named request for risk capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRequest {
    /// Strategy name; must be unique within one allocation run.
    pub name: String,
    /// Capacity requested.
    pub amount: Decimal,
}

impl AllocationRequest {
    /// Create a request.
    pub fn new(name: impl Into<String>, amount: Decimal) -> Self {
        Self {
            name: name.into(),
            amount,
        }
    }
}

/// Outcome of one allocation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationReport {
    /// Capacity available at the start.
    pub total_capacity: Decimal,
    /// Capacity left after every request finished.
    pub remaining_capacity: Decimal,
    /// Granted requests only; timed-out requests are absent.
    pub granted: BTreeMap<String, Decimal>,
    /// Terminal status of every request.
    pub statuses: BTreeMap<String, AllocationStatus>,
    /// Wall-clock time from dispatch to the last join.
    pub elapsed_ms: u64,
}

impl AllocationReport {
    /// Names of requests that timed out.
    #[must_use]
    pub fn timed_out(&self) -> Vec<&str> {
        self.statuses
            .iter()
            .filter(|(_, status)| **status == AllocationStatus::TimedOut)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Sum of granted amounts.
    #[must_use]
    pub fn granted_total(&self) -> Decimal {
        self.granted.values().copied().sum()
    }
}

/// Remaining capacity plus bookkeeping, guarded by one lock.
#[derive(Debug)]
struct RiskPool {
    remaining: Decimal,
    granted: BTreeMap<String, Decimal>,
    statuses: BTreeMap<String, AllocationStatus>,
}

impl RiskPool {
    /// Deduct `amount` if it fits. The check and the deduction happen under
    /// the same lock acquisition.
    fn try_reserve(&mut self, name: &str, amount: Decimal) -> bool {
        if self.remaining < amount {
            return false;
        }
        self.remaining -= amount;
        debug_assert!(self.remaining >= Decimal::ZERO);
        self.granted.insert(name.to_string(), amount);
        self.statuses
            .insert(name.to_string(), AllocationStatus::Granted);
        true
    }

    fn expire(&mut self, name: &str) {
        self.statuses
            .insert(name.to_string(), AllocationStatus::TimedOut);
    }
}

/// Grants requests against a fixed total under a shared deadline.
#[derive(Debug, Clone)]
pub struct RiskAllocator {
    total: Decimal,
    config: AllocatorConfig,
    cancel: CancellationToken,
}

impl RiskAllocator {
    /// Create an allocator over `total` capacity.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `total` is negative or the poll
    /// interval is zero.
    pub fn new(total: Decimal, config: AllocatorConfig) -> EngineResult<Self> {
        if total < Decimal::ZERO {
            return Err(EngineError::invalid_input(format!(
                "total capacity must not be negative, got {total}"
            )));
        }
        if config.poll_interval_ms == 0 {
            return Err(EngineError::invalid_input("poll interval must be positive"));
        }
        Ok(Self {
            total,
            config,
            cancel: CancellationToken::new(),
        })
    }

    /// Stop polling early when `token` is cancelled.
    ///
    /// Pollers check the token at the top of each iteration; one that is
    /// sleeping finishes its backoff first.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Run one poller per request until each is granted or times out.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for empty, duplicate, or negative
    /// requests, and a computation error if a poller thread fails.
    pub fn allocate(&self, requests: &[AllocationRequest]) -> EngineResult<AllocationReport> {
        validate_requests(requests)?;

        let started = Instant::now();
        let deadline = started + self.config.deadline();
        let poll_interval = self.config.poll_interval();

        info!(
            total = %self.total,
            requests = requests.len(),
            deadline_ms = self.config.deadline_ms,
            "Starting risk allocation"
        );

        let pool = RiskPool {
            remaining: self.total,
            granted: BTreeMap::new(),
            statuses: requests
                .iter()
                .map(|r| (r.name.clone(), AllocationStatus::Pending))
                .collect(),
        };

        let tasks: Vec<_> = requests
            .iter()
            .map(|request| {
                let name = request.name.clone();
                let amount = request.amount;
                let cancel = self.cancel.clone();
                Task::new(format!("allocate-{name}"), move |pool: &Mutex<RiskPool>| {
                    let status = poll_until_granted(
                        pool,
                        &name,
                        amount,
                        deadline,
                        poll_interval,
                        &cancel,
                    );
                    record_allocation(status.as_str());
                    Ok(())
                })
            })
            .collect();

        let pool = Dispatcher::new("risk_allocator").run(pool, tasks)?;

        let report = AllocationReport {
            total_capacity: self.total,
            remaining_capacity: pool.remaining,
            granted: pool.granted,
            statuses: pool.statuses,
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };
        info!(
            granted = report.granted.len(),
            timed_out = report.timed_out().len(),
            remaining = %report.remaining_capacity,
            "Risk allocation complete"
        );
        Ok(report)
    }
}

/// Poll loop for one request. Returns its terminal status.
fn poll_until_granted(
    pool: &Mutex<RiskPool>,
    name: &str,
    amount: Decimal,
    deadline: Instant,
    poll_interval: Duration,
    cancel: &CancellationToken,
) -> AllocationStatus {
    let mut attempts = 0_u32;
    loop {
        if cancel.is_cancelled() {
            pool.lock().expire(name);
            warn!(strategy = name, attempts, "Allocation cancelled");
            return AllocationStatus::TimedOut;
        }

        attempts += 1;
        if pool.lock().try_reserve(name, amount) {
            debug!(strategy = name, %amount, attempts, "Allocation granted");
            return AllocationStatus::Granted;
        }

        let now = Instant::now();
        if now >= deadline {
            pool.lock().expire(name);
            warn!(strategy = name, %amount, attempts, "Allocation timed out");
            return AllocationStatus::TimedOut;
        }
        thread::sleep(poll_interval.min(deadline - now));
    }
}

fn validate_requests(requests: &[AllocationRequest]) -> EngineResult<()> {
    let mut seen = BTreeSet::new();
    for request in requests {
        if request.name.trim().is_empty() {
            return Err(EngineError::invalid_input("strategy names must not be empty"));
        }
        if !seen.insert(request.name.as_str()) {
            return Err(EngineError::invalid_input(format!(
                "duplicate strategy '{}'",
                request.name
            )));
        }
        if request.amount < Decimal::ZERO {
            return Err(EngineError::invalid_input(format!(
                "strategy '{}' requests a negative amount {}",
                request.name, request.amount
            )));
        }
    }
    Ok(())
}

/// Allocate `total` across `strategies` with the default poll interval.
///
/// Returns only the granted requests.
///
/// # Errors
///
/// Same as [`RiskAllocator::allocate`].
pub fn allocate_risk(
    total: Decimal,
    strategies: &[(&str, Decimal)],
    deadline: Duration,
) -> EngineResult<BTreeMap<String, Decimal>> {
    let requests: Vec<AllocationRequest> = strategies
        .iter()
        .map(|(name, amount)| AllocationRequest::new(*name, *amount))
        .collect();
    let config = AllocatorConfig::default().with_deadline(deadline);

    Ok(RiskAllocator::new(total, config)?.allocate(&requests)?.granted)
}
