//! Period-over-period returns from a price series.

use crate::error::{EngineError, EngineResult};

fn validate_prices(prices: &[f64]) -> EngineResult<()> {
    if prices.len() < 2 {
        return Err(EngineError::invalid_input(
            "at least two prices are needed to compute returns",
        ));
    }
    if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
        return Err(EngineError::invalid_input("prices must be finite and positive"));
    }
    Ok(())
}

/// Simple returns `(p[t] - p[t-1]) / p[t-1]`.
pub fn simple_returns(prices: &[f64]) -> EngineResult<Vec<f64>> {
    validate_prices(prices)?;
    Ok(prices.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect())
}

/// Log returns `ln(p[t] / p[t-1])`.
pub fn log_returns(prices: &[f64]) -> EngineResult<Vec<f64>> {
    validate_prices(prices)?;
    Ok(prices.windows(2).map(|w| (w[1] / w[0]).ln()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_returns() {
        let returns = simple_returns(&[100.0, 110.0, 99.0]).unwrap();
        assert!((returns[0] - 0.10).abs() < 1e-12);
        assert!((returns[1] + 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_log_returns_sum_to_total_log_return() {
        let prices = [100.0, 105.0, 98.0, 120.0];
        let total: f64 = log_returns(&prices).unwrap().iter().sum();
        assert!((total - (120.0_f64 / 100.0).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_returns_reject_non_positive_prices() {
        assert!(log_returns(&[100.0, 0.0]).is_err());
        assert!(simple_returns(&[100.0]).is_err());
    }
}
