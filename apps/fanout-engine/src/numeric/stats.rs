//! Descriptive statistics over slices.

use crate::error::{EngineError, EngineResult, ErrorCode};

use super::window::validate_window;

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> EngineResult<f64> {
    if values.is_empty() {
        return Err(EngineError::invalid_input("cannot take the mean of an empty series"));
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divisor `n`).
pub fn population_std_dev(values: &[f64]) -> EngineResult<f64> {
    window_std(values, 0)
}

/// Standard deviation of one window with divisor `len - ddof`.
///
/// `ddof = 0` is the population deviation; `ddof = 1` the sample deviation.
pub fn window_std(values: &[f64], ddof: usize) -> EngineResult<f64> {
    let center = mean(values)?;
    if ddof >= values.len() {
        return Err(EngineError::new(
            ErrorCode::InvalidWindow,
            format!(
                "ddof {ddof} leaves no degrees of freedom for {} values",
                values.len()
            ),
        ));
    }

    let squared: f64 = values.iter().map(|v| (v - center).powi(2)).sum();
    Ok((squared / (values.len() - ddof) as f64).sqrt())
}

/// Rolling standard deviation over every full window.
///
/// Element `i` is [`window_std`] of `values[i..i + window]`.
pub fn rolling_std(values: &[f64], window: usize, ddof: usize) -> EngineResult<Vec<f64>> {
    let positions = validate_window(values.len(), window)?;
    (0..positions)
        .map(|start| window_std(&values[start..start + window], ddof))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_population_std_dev_known_value() {
        let returns = [0.02, 0.03, 0.01, -0.01, 0.00];
        let std = population_std_dev(&returns).unwrap();
        assert!((std - 0.014_142_135_6).abs() < 1e-9);
    }

    #[test]
    fn test_constant_series_has_zero_deviation() {
        assert_eq!(population_std_dev(&[5.0, 5.0, 5.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_sample_std_dev_uses_ddof() {
        let values = [1.0, 2.0, 3.0, 4.0];
        let population = window_std(&values, 0).unwrap();
        let sample = window_std(&values, 1).unwrap();

        assert!((population - 1.25_f64.sqrt()).abs() < 1e-12);
        assert!((sample - (5.0_f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_ddof_must_leave_freedom() {
        let err = window_std(&[1.0, 2.0], 2).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidWindow);
    }

    #[test]
    fn test_rolling_std_positions() {
        let result = rolling_std(&[1.0, 3.0, 1.0, 3.0], 2, 0).unwrap();
        assert_eq!(result.len(), 3);
        assert!(result.iter().all(|v| (v - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_mean_rejects_empty() {
        assert_eq!(mean(&[]).unwrap_err().code(), ErrorCode::InvalidInput);
    }
}
