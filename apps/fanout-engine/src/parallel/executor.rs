//! Partition-and-join executor on a caller-sized rayon pool.
//!
//! Two combination strategies are supported:
//!
//! - [`ParallelExecutor::map_ranges`]: each partition writes straight into its
//!   own pre-allocated slice of the output. Slices come from `split_at_mut`,
//!   so no lock is involved.
//! - [`ParallelExecutor::map_keys`]: each named input produces one value that
//!   is inserted into a shared map under a mutex.
//!
//! In both cases every unit runs to completion before the first failure (by
//! unit order) is returned.
//!
//! # Example
//!
//! ```rust
//! use fanout_engine::parallel::{ParallelExecutor, balanced_ranges};
//!
//! let executor = ParallelExecutor::new(2).unwrap();
//! let partitions = balanced_ranges(5, executor.workers()).unwrap();
//! let squares = executor
//!     .map_ranges(5, &partitions, |range, slot: &mut [usize]| {
//!         for (offset, i) in range.enumerate() {
//!             slot[offset] = i * i;
//!         }
//!         Ok(())
//!     })
//!     .unwrap();
//! assert_eq!(squares, vec![0, 1, 4, 9, 16]);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::join_outcomes;
use super::partition::{Partition, balanced_ranges, validate_partitions};
use crate::error::{EngineError, EngineResult, panic_message};
use crate::observability::record_unit_completed;

/// Default metrics label for units run by an executor.
const DEFAULT_CALL_SITE: &str = "executor";

/// Fan-out/fan-in executor backed by a dedicated thread pool.
pub struct ParallelExecutor {
    workers: usize,
    call_site: &'static str,
    pool: rayon::ThreadPool,
}

impl fmt::Debug for ParallelExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParallelExecutor")
            .field("workers", &self.workers)
            .field("call_site", &self.call_site)
            .finish_non_exhaustive()
    }
}

impl ParallelExecutor {
    /// Build an executor with exactly `workers` threads.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `workers` is zero or the pool cannot
    /// be created.
    pub fn new(workers: usize) -> EngineResult<Self> {
        if workers == 0 {
            return Err(EngineError::invalid_worker_count(workers));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("fanout-worker-{i}"))
            .build()
            .map_err(|e| {
                EngineError::invalid_worker_count(workers)
                    .with_context("pool_error", e.to_string())
            })?;

        Ok(Self {
            workers,
            call_site: DEFAULT_CALL_SITE,
            pool,
        })
    }

    /// Label units with `call_site` in logs and metrics.
    #[must_use]
    pub const fn with_call_site(mut self, call_site: &'static str) -> Self {
        self.call_site = call_site;
        self
    }

    /// Number of worker threads.
    #[must_use]
    pub const fn workers(&self) -> usize {
        self.workers
    }

    /// Fill a fresh output of `output_len` slots, one partition per unit.
    ///
    /// `work` receives the partition's owned output positions and the
    /// matching slice of the output. Partitions are validated before any
    /// unit starts.
    pub fn map_ranges<T, F>(
        &self,
        output_len: usize,
        partitions: &[Partition],
        work: F,
    ) -> EngineResult<Vec<T>>
    where
        T: Default + Clone + Send,
        F: Fn(Range<usize>, &mut [T]) -> Result<(), String> + Sync,
    {
        validate_partitions(output_len, partitions)?;

        info!(
            call_site = self.call_site,
            output_len,
            partitions = partitions.len(),
            workers = self.workers,
            "Dispatching partitioned units"
        );

        let mut output = vec![T::default(); output_len];
        let slots = split_disjoint(&mut output, partitions);

        let outcomes: Vec<EngineResult<()>> = self.pool.install(|| {
            slots
                .into_par_iter()
                .map(|(partition, slot)| {
                    self.run_unit(&partition.label(), || work(partition.range(), slot))
                })
                .collect()
        });
        join_outcomes(self.call_site, outcomes)?;

        Ok(output)
    }

    /// [`map_ranges`](Self::map_ranges) over a balanced split with one
    /// partition per worker.
    pub fn map_balanced<T, F>(&self, output_len: usize, work: F) -> EngineResult<Vec<T>>
    where
        T: Default + Clone + Send,
        F: Fn(Range<usize>, &mut [T]) -> Result<(), String> + Sync,
    {
        let partitions = balanced_ranges(output_len, self.workers)?;
        self.map_ranges(output_len, &partitions, work)
    }

    /// Apply `work` to every named input; one unit per key.
    ///
    /// The result has exactly the input's keys.
    pub fn map_keys<V, R, F>(
        &self,
        input: &BTreeMap<String, V>,
        work: F,
    ) -> EngineResult<BTreeMap<String, R>>
    where
        V: Sync,
        R: Send,
        F: Fn(&str, &V) -> Result<R, String> + Sync,
    {
        info!(
            call_site = self.call_site,
            keys = input.len(),
            workers = self.workers,
            "Dispatching keyed units"
        );

        let results = Mutex::new(BTreeMap::new());
        let units: Vec<(&String, &V)> = input.iter().collect();

        let outcomes: Vec<EngineResult<()>> = self.pool.install(|| {
            units
                .into_par_iter()
                .map(|(key, value)| {
                    self.run_unit(key, || {
                        let computed = work(key, value)?;
                        results.lock().insert(key.clone(), computed);
                        Ok(())
                    })
                })
                .collect()
        });
        join_outcomes(self.call_site, outcomes)?;

        Ok(results.into_inner())
    }

    /// Run one unit, converting errors and panics into [`EngineError`]s.
    fn run_unit<R>(&self, unit: &str, f: impl FnOnce() -> Result<R, String>) -> EngineResult<R> {
        let started = Instant::now();

        let outcome = match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(message)) => Err(EngineError::computation_failed(unit, message)),
            Err(payload) => Err(EngineError::worker_panicked(
                unit,
                panic_message(payload.as_ref()),
            )),
        };

        let elapsed = started.elapsed();
        record_unit_completed(self.call_site, outcome.is_ok(), elapsed.as_secs_f64());
        match &outcome {
            Ok(_) => debug!(
                call_site = self.call_site,
                unit,
                elapsed_us = elapsed.as_micros() as u64,
                "Unit completed"
            ),
            Err(e) => warn!(call_site = self.call_site, unit, error = %e, "Unit failed"),
        }

        outcome
    }
}

/// Carve `output` into one mutable slice per partition.
///
/// Partitions must already be validated as an in-order cover of `output`.
fn split_disjoint<'a, T>(
    output: &'a mut [T],
    partitions: &'a [Partition],
) -> Vec<(&'a Partition, &'a mut [T])> {
    let mut rest = output;
    let mut slots = Vec::with_capacity(partitions.len());
    for partition in partitions {
        let (slot, tail) = std::mem::take(&mut rest).split_at_mut(partition.len());
        slots.push((partition, slot));
        rest = tail;
    }
    slots
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_zero_workers_rejected() {
        let err = ParallelExecutor::new(0).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidWorkerCount);
    }

    #[test]
    fn test_map_ranges_writes_disjoint_slots() {
        let executor = ParallelExecutor::new(3).unwrap();
        let partitions = balanced_ranges(10, 3).unwrap();

        let result = executor
            .map_ranges(10, &partitions, |range, slot: &mut [usize]| {
                for (offset, i) in range.enumerate() {
                    slot[offset] = i * 10;
                }
                Ok(())
            })
            .unwrap();

        assert_eq!(result, (0..10).map(|i| i * 10).collect::<Vec<_>>());
    }

    #[test]
    fn test_map_ranges_rejects_bad_partitions_before_running() {
        let executor = ParallelExecutor::new(2).unwrap();
        let calls = AtomicUsize::new(0);
        let partitions = vec![Partition::new(0, 0, 3), Partition::new(1, 2, 4)];

        let err = executor
            .map_ranges(4, &partitions, |_, _: &mut [f64]| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::InvalidPartition);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_failure_joins_every_unit_and_reports_first() {
        let executor = ParallelExecutor::new(4).unwrap();
        let completed = AtomicUsize::new(0);

        let err = executor
            .map_balanced(8, |range, _: &mut [f64]| {
                completed.fetch_add(1, Ordering::SeqCst);
                if range.start >= 4 {
                    Err(format!("cannot handle {range:?}"))
                } else {
                    Ok(())
                }
            })
            .unwrap_err();

        assert_eq!(completed.load(Ordering::SeqCst), 4);
        assert_eq!(err.code(), ErrorCode::ComputationFailed);
        assert_eq!(err.unit(), Some("partition-2"));
    }

    #[test]
    fn test_panicking_unit_is_reported() {
        let executor = ParallelExecutor::new(2).unwrap();
        let completed = AtomicUsize::new(0);

        let err = executor
            .map_balanced(4, |range, _: &mut [f64]| {
                if range.start == 0 {
                    panic!("worker blew up");
                }
                completed.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap_err();

        assert_eq!(completed.load(Ordering::SeqCst), 1);
        assert_eq!(err.code(), ErrorCode::WorkerPanicked);
        assert_eq!(err.unit(), Some("partition-0"));
        assert!(err.message().contains("worker blew up"));
    }

    #[test]
    fn test_map_keys_preserves_key_set() {
        let executor = ParallelExecutor::new(2).unwrap();
        let input: BTreeMap<String, Vec<f64>> = [
            ("AAPL".to_string(), vec![1.0, 2.0]),
            ("MSFT".to_string(), vec![3.0]),
            ("PETR4".to_string(), vec![]),
        ]
        .into_iter()
        .collect();

        let result = executor
            .map_keys(&input, |_, values| Ok(values.len()))
            .unwrap();

        assert_eq!(
            result.keys().collect::<Vec<_>>(),
            input.keys().collect::<Vec<_>>()
        );
        assert_eq!(result["AAPL"], 2);
        assert_eq!(result["PETR4"], 0);
    }

    #[test]
    fn test_map_keys_failure_names_key() {
        let executor = ParallelExecutor::new(2).unwrap();
        let input: BTreeMap<String, i32> = [("good".to_string(), 1), ("bad".to_string(), -1)]
            .into_iter()
            .collect();

        let err = executor
            .map_keys(&input, |_, v| {
                if *v < 0 {
                    Err("negative".to_string())
                } else {
                    Ok(*v)
                }
            })
            .unwrap_err();

        assert_eq!(err.unit(), Some("bad"));
    }

    #[test]
    fn test_split_disjoint_lengths() {
        let mut output = vec![0_u8; 7];
        let partitions = balanced_ranges(7, 3).unwrap();
        let slots = split_disjoint(&mut output, &partitions);

        let lengths: Vec<usize> = slots.iter().map(|(_, s)| s.len()).collect();
        assert_eq!(lengths, vec![2, 2, 3]);
    }
}
