//! Rolling volatility over one long series, split across workers.
//!
//! For `n` returns and window `w` there are `n - w + 1` output positions.
//! Those positions, not the raw input, are divided across workers, so the
//! last worker's final window ends exactly at the series bound.

use crate::error::{EngineError, EngineResult, ErrorCode};
use crate::numeric::{validate_window, window_std};
use crate::parallel::ParallelExecutor;

/// Rolling population standard deviation computed by `workers` threads.
///
/// Element `i` is the standard deviation of `returns[i..i + window]`. The
/// result is identical for any worker count.
///
/// # Example
///
/// ```rust
/// use fanout_engine::analytics::parallel_volatility;
///
/// let returns = [0.01, -0.02, 0.015, 0.0, 0.03, -0.01];
/// let vol = parallel_volatility(&returns, 3, 2).unwrap();
/// assert_eq!(vol.len(), 4);
/// ```
pub fn parallel_volatility(returns: &[f64], window: usize, workers: usize) -> EngineResult<Vec<f64>> {
    parallel_rolling_std(returns, window, 0, workers)
}

/// Rolling standard deviation with divisor `window - ddof`.
pub fn parallel_rolling_std(
    values: &[f64],
    window: usize,
    ddof: usize,
    workers: usize,
) -> EngineResult<Vec<f64>> {
    let positions = validate_window(values.len(), window)?;
    if ddof >= window {
        return Err(EngineError::new(
            ErrorCode::InvalidWindow,
            format!("ddof {ddof} leaves no degrees of freedom for window {window}"),
        ));
    }

    let executor = ParallelExecutor::new(workers)?.with_call_site("volatility");
    executor.map_balanced(positions, |range, slot: &mut [f64]| {
        for (offset, start) in range.enumerate() {
            slot[offset] =
                window_std(&values[start..start + window], ddof).map_err(|e| e.to_string())?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::rolling_std;

    const RETURNS: [f64; 10] = [
        0.012, -0.004, 0.021, -0.017, 0.003, 0.009, -0.011, 0.026, -0.002, 0.005,
    ];

    #[test]
    fn test_matches_reference_for_every_worker_count() {
        let reference = rolling_std(&RETURNS, 4, 0).unwrap();
        let positions = RETURNS.len() - 4 + 1;

        for workers in [1, 2, 3, positions, positions + 3] {
            let result = parallel_volatility(&RETURNS, 4, workers).unwrap();
            assert_eq!(result, reference, "workers = {workers}");
        }
    }

    #[test]
    fn test_window_equal_to_length_has_one_position() {
        let result = parallel_volatility(&RETURNS, RETURNS.len(), 4).unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_sample_deviation_with_ddof() {
        let reference = rolling_std(&RETURNS, 5, 1).unwrap();
        let result = parallel_rolling_std(&RETURNS, 5, 1, 3).unwrap();
        assert_eq!(result, reference);
    }

    #[test]
    fn test_configuration_errors() {
        assert_eq!(
            parallel_volatility(&RETURNS, 0, 2).unwrap_err().code(),
            ErrorCode::InvalidWindow
        );
        assert_eq!(
            parallel_volatility(&RETURNS, 11, 2).unwrap_err().code(),
            ErrorCode::InvalidWindow
        );
        assert_eq!(
            parallel_volatility(&RETURNS, 3, 0).unwrap_err().code(),
            ErrorCode::InvalidWorkerCount
        );
        assert_eq!(
            parallel_volatility(&[], 1, 1).unwrap_err().code(),
            ErrorCode::InvalidInput
        );
        assert!(parallel_rolling_std(&RETURNS, 3, 3, 2).unwrap_err().is_configuration());
    }
}
