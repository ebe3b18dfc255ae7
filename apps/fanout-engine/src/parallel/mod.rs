//! Fan-out/fan-in primitives shared by every call site.
//!
//! - [`partition`]: balanced, overlap-free splits of an output index range
//! - [`ParallelExecutor`]: partitioned numeric work on a caller-sized pool
//! - [`Dispatcher`]: one thread per task over a single lock-protected state

mod dispatch;
mod executor;
pub mod partition;

pub use dispatch::{Dispatcher, Task};
pub use executor::ParallelExecutor;
pub use partition::{Partition, balanced_ranges, validate_partitions};

use tracing::warn;

use crate::error::EngineResult;

/// Collapse per-unit outcomes (already joined) into the first failure.
fn join_outcomes(call_site: &str, outcomes: Vec<EngineResult<()>>) -> EngineResult<()> {
    let total = outcomes.len();
    let mut failures = outcomes.into_iter().filter_map(Result::err);

    let Some(first) = failures.next() else {
        return Ok(());
    };
    let failed = 1 + failures.count();
    warn!(call_site, failed, total, error = %first, "Units failed after join");
    Err(first)
}
