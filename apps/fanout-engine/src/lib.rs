// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::cast_precision_loss,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Fan-out Engine - concurrent fan-out/fan-in executor
//!
//! Splits a workload into independent units, runs them concurrently, and
//! merges the results only after every unit has been joined.
//!
//! # Call sites
//!
//! - `analytics`: per-key moving averages and partitioned rolling volatility
//!   on a caller-sized rayon pool
//! - `orders`: concurrent traders appending to one locked order book with a
//!   shared monotonic id counter
//! - `risk`: bounded-capacity allocator with polling workers and a shared
//!   deadline
//! - `monitor`: range-crossing watchers that overlap their sampling waits
//! - `feed`: simulated price feeds stopped by a shared cancellation token
//!
//! # Supporting modules
//!
//! - `parallel`: partitioning, the rayon executor, and the thread dispatcher
//! - `numeric`, `simulation`: single-threaded kernels and demo data
//! - `config`, `observability`, `error`: YAML config, tracing/metrics, and
//!   the error taxonomy
//!
//! Configuration errors are raised before any worker starts. Worker failures
//! are surfaced after all workers are joined, naming the failing unit.
//! Allocation timeouts are reported by omission, never as errors.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Core
// =============================================================================

/// Error codes and the engine error type.
pub mod error;

/// Partitioning and the two fan-out/fan-in executors.
pub mod parallel;

/// Single-threaded numeric kernels.
pub mod numeric;

/// Price path generators for demo inputs.
pub mod simulation;

// =============================================================================
// Call sites
// =============================================================================

pub mod analytics;
pub mod feed;
pub mod monitor;
pub mod orders;
pub mod risk;

// =============================================================================
// Infrastructure
// =============================================================================

/// YAML configuration loading and validation.
pub mod config;

/// Tracing subscriber and Prometheus metrics.
pub mod observability;

// =============================================================================
// Re-exports
// =============================================================================

pub use analytics::{parallel_moving_averages, parallel_rolling_std, parallel_volatility};
pub use error::{EngineError, EngineResult, ErrorCode};
pub use feed::{PriceFeedSimulator, PriceSnapshot};
pub use monitor::{PriceSampler, RangeCrossMonitor, UniformSampler};
pub use orders::{Order, OrderBook, Side, simulate_traders, simulate_traders_seeded};
pub use parallel::{Dispatcher, ParallelExecutor, Partition};
pub use risk::{AllocationReport, AllocationStatus, RiskAllocator, allocate_risk};
