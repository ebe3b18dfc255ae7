//! Partitioning of an output index range across workers.
//!
//! Sliding-window helpers partition the *output* positions, not the raw
//! input, so a worker owning positions `start..end` reads input
//! `start..end + window - 1` and never past the end of the series.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// A contiguous, half-open range of output positions owned by one worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    /// Position of this partition in the split (0-based).
    pub index: usize,
    /// First owned output position.
    pub start: usize,
    /// One past the last owned output position.
    pub end: usize,
}

impl Partition {
    /// Create a partition.
    #[must_use]
    pub const fn new(index: usize, start: usize, end: usize) -> Self {
        Self { index, start, end }
    }

    /// Owned output positions.
    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Number of owned positions.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether this partition owns no positions.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unit name used in logs and errors.
    #[must_use]
    pub fn label(&self) -> String {
        format!("partition-{}", self.index)
    }
}

/// Split `0..len` into `workers` contiguous ranges of near-equal size.
///
/// Boundaries follow `floor(i * len / workers)` for `i` in `0..=workers`, the
/// integer `linspace` split. When `workers > len` some partitions are empty.
pub fn balanced_ranges(len: usize, workers: usize) -> EngineResult<Vec<Partition>> {
    if workers == 0 {
        return Err(EngineError::invalid_worker_count(workers));
    }

    let boundary = |i: usize| (i as u128 * len as u128 / workers as u128) as usize;
    Ok((0..workers)
        .map(|i| Partition::new(i, boundary(i), boundary(i + 1)))
        .collect())
}

/// Check that `partitions` exactly cover `0..len`, in order, without overlap.
pub fn validate_partitions(len: usize, partitions: &[Partition]) -> EngineResult<()> {
    if partitions.is_empty() {
        return Err(EngineError::invalid_partition("no partitions supplied"));
    }

    let mut expected_start = 0;
    for (position, partition) in partitions.iter().enumerate() {
        if partition.index != position {
            return Err(EngineError::invalid_partition(format!(
                "partition at position {position} has index {}",
                partition.index
            )));
        }
        if partition.start > partition.end {
            return Err(EngineError::invalid_partition(format!(
                "{} is reversed ({}..{})",
                partition.label(),
                partition.start,
                partition.end
            )));
        }
        if partition.start < expected_start {
            return Err(EngineError::invalid_partition(format!(
                "{} overlaps its predecessor at {}",
                partition.label(),
                partition.start
            )));
        }
        if partition.start > expected_start {
            return Err(EngineError::invalid_partition(format!(
                "gap before {}: positions {expected_start}..{} are unowned",
                partition.label(),
                partition.start
            )));
        }
        if partition.end > len {
            return Err(EngineError::invalid_partition(format!(
                "{} ends at {} past the output length {len}",
                partition.label(),
                partition.end
            )));
        }
        expected_start = partition.end;
    }

    if expected_start != len {
        return Err(EngineError::invalid_partition(format!(
            "positions {expected_start}..{len} are unowned"
        )));
    }
    Ok(())
}
