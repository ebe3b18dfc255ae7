//! Per-asset moving averages computed concurrently.

use std::collections::BTreeMap;

use crate::error::{EngineError, EngineResult};
use crate::numeric::{moving_average, validate_series};
use crate::parallel::ParallelExecutor;

/// Moving average of every named series, one unit per series.
///
/// The result has exactly the input's keys, and each value equals
/// [`moving_average`] of that series. Every series is checked against
/// `window` and for non-finite values before any worker starts.
///
/// # Example
///
/// ```rust
/// use std::collections::BTreeMap;
/// use fanout_engine::analytics::parallel_moving_averages;
///
/// let mut prices = BTreeMap::new();
/// prices.insert("PETR4".to_string(), vec![10.0, 11.0, 12.0, 13.0]);
/// prices.insert("VALE3".to_string(), vec![60.0, 62.0, 61.0]);
///
/// let averages = parallel_moving_averages(&prices, 2, 2).unwrap();
/// assert_eq!(averages["VALE3"].len(), 2);
/// ```
pub fn parallel_moving_averages(
    series: &BTreeMap<String, Vec<f64>>,
    window: usize,
    workers: usize,
) -> EngineResult<BTreeMap<String, Vec<f64>>> {
    for (name, values) in series {
        validate_series(values, window).map_err(|e| {
            EngineError::new(e.code(), format!("series '{name}': {}", e.message()))
                .with_context("series", name.clone())
        })?;
    }

    let executor = ParallelExecutor::new(workers)?.with_call_site("moving_average");
    executor.map_keys(series, |_, values| {
        moving_average(values, window).map_err(|e| e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn sample() -> BTreeMap<String, Vec<f64>> {
        [
            ("PETR4", vec![10.0, 11.0, 12.0, 13.0, 14.0, 15.0]),
            ("VALE3", vec![60.0, 62.0, 61.0, 65.0]),
            ("ITUB4", vec![30.0, 30.0, 30.0]),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    #[test]
    fn test_matches_single_threaded_reference() {
        let series = sample();
        let result = parallel_moving_averages(&series, 3, 2).unwrap();

        assert_eq!(result.len(), series.len());
        for (name, values) in &series {
            assert_eq!(result[name], moving_average(values, 3).unwrap());
        }
    }

    #[test]
    fn test_more_workers_than_series() {
        let result = parallel_moving_averages(&sample(), 2, 16).unwrap();
        assert_eq!(result["ITUB4"], vec![30.0, 30.0]);
    }

    #[test]
    fn test_window_longer_than_any_series_fails_fast() {
        let err = parallel_moving_averages(&sample(), 5, 2).unwrap_err();

        assert_eq!(err.code(), ErrorCode::InvalidWindow);
        assert!(err.is_configuration());
        assert!(err.context().iter().any(|(k, _)| k == "series"));
    }

    #[test]
    fn test_non_finite_value_fails_before_dispatch() {
        let mut series = sample();
        series.insert("BAD".to_string(), vec![1.0, f64::NAN, 3.0]);

        let err = parallel_moving_averages(&series, 2, 2).unwrap_err();

        assert!(err.is_configuration());
        assert_eq!(err.code(), ErrorCode::InvalidInput);
        assert_eq!(err.unit(), None);
        assert!(err.context().iter().any(|(k, v)| k == "series" && v == "BAD"));
    }

    #[test]
    fn test_zero_workers_fails_fast() {
        let err = parallel_moving_averages(&sample(), 2, 0).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidWorkerCount);
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        let result = parallel_moving_averages(&BTreeMap::new(), 3, 2).unwrap();
        assert!(result.is_empty());
    }
}
