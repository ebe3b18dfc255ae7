//! Gaussian price path generators.
//!
//! Both generators take the RNG by reference so callers can seed them for
//! reproducible runs.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::error::{EngineError, EngineResult};

fn normal(mean: f64, sigma: f64) -> EngineResult<Normal<f64>> {
    Normal::new(mean, sigma)
        .map_err(|e| EngineError::invalid_input(format!("invalid normal distribution: {e}")))
}

/// Additive random walk: `p[t] = p[t-1] + N(0, sigma)`.
///
/// Returns `days + 1` prices, starting with `s0`.
pub fn simulate_random_walk<R: Rng + ?Sized>(
    s0: f64,
    sigma: f64,
    days: usize,
    rng: &mut R,
) -> EngineResult<Vec<f64>> {
    if !s0.is_finite() || !sigma.is_finite() || sigma < 0.0 {
        return Err(EngineError::invalid_input(
            "s0 must be finite and sigma must be finite and non-negative",
        ));
    }
    let noise = normal(0.0, sigma)?;

    let mut prices = Vec::with_capacity(days + 1);
    prices.push(s0);
    let mut last = s0;
    for _ in 0..days {
        last += noise.sample(rng);
        prices.push(last);
    }
    Ok(prices)
}

/// Multiplicative path: `p[t] = p[t-1] * (1 + N(mu, sigma))`.
///
/// Returns `days + 1` prices, starting with `initial_price`.
pub fn simulate_gbm_path<R: Rng + ?Sized>(
    initial_price: f64,
    mu: f64,
    sigma: f64,
    days: usize,
    rng: &mut R,
) -> EngineResult<Vec<f64>> {
    if initial_price.is_nan() || initial_price <= 0.0 || sigma < 0.0 || days == 0 {
        return Err(EngineError::invalid_input(
            "initial price must be > 0, sigma >= 0 and days > 0",
        ));
    }
    let daily = normal(mu, sigma)?;

    let mut prices = Vec::with_capacity(days + 1);
    prices.push(initial_price);
    let mut last = initial_price;
    for _ in 0..days {
        last *= 1.0 + daily.sample(rng);
        prices.push(last);
    }
    Ok(prices)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_random_walk_length_and_start() {
        let mut rng = StdRng::seed_from_u64(7);
        let path = simulate_random_walk(100.0, 1.0, 10, &mut rng).unwrap();

        assert_eq!(path.len(), 11);
        assert_eq!(path[0], 100.0);
    }

    #[test]
    fn test_zero_sigma_is_flat() {
        let mut rng = StdRng::seed_from_u64(7);
        let walk = simulate_random_walk(50.0, 0.0, 5, &mut rng).unwrap();
        assert!(walk.iter().all(|p| *p == 50.0));

        let gbm = simulate_gbm_path(50.0, 0.0, 0.0, 5, &mut rng).unwrap();
        assert!(gbm.iter().all(|p| *p == 50.0));
    }

    #[test]
    fn test_seeded_paths_are_reproducible() {
        let a = simulate_gbm_path(100.0, 0.0, 0.01, 20, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = simulate_gbm_path(100.0, 0.0, 0.01, 20, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_gbm_rejects_bad_inputs() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(simulate_gbm_path(0.0, 0.0, 0.01, 10, &mut rng).is_err());
        assert!(simulate_gbm_path(100.0, 0.0, -0.01, 10, &mut rng).is_err());
        assert!(simulate_gbm_path(100.0, 0.0, 0.01, 0, &mut rng).is_err());
    }
}
