//! Sliding-window kernels.

use crate::error::{EngineError, EngineResult};

/// Check that `window` fits a series of length `len`.
///
/// Returns the number of valid window positions, `len - window + 1`.
pub fn validate_window(len: usize, window: usize) -> EngineResult<usize> {
    if len == 0 {
        return Err(EngineError::invalid_input("series must not be empty"));
    }
    if window == 0 || window > len {
        return Err(EngineError::invalid_window(window, len));
    }
    Ok(len - window + 1)
}

/// [`validate_window`] plus a check that every value is finite.
pub fn validate_series(values: &[f64], window: usize) -> EngineResult<usize> {
    let positions = validate_window(values.len(), window)?;
    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(
            EngineError::invalid_input("series contains non-finite values")
                .with_context("index", index.to_string()),
        );
    }
    Ok(positions)
}

/// Discrete convolution keeping only positions where the kernel fully
/// overlaps the signal.
///
/// The kernel is applied reversed, so `convolve_valid(x, k)[i]` is
/// `sum(x[i + j] * k[k.len() - 1 - j])`.
pub fn convolve_valid(signal: &[f64], kernel: &[f64]) -> EngineResult<Vec<f64>> {
    let positions = validate_window(signal.len(), kernel.len())?;

    let reversed: Vec<f64> = kernel.iter().rev().copied().collect();
    Ok((0..positions)
        .map(|start| {
            signal[start..start + reversed.len()]
                .iter()
                .zip(&reversed)
                .map(|(x, k)| x * k)
                .sum()
        })
        .collect())
}

/// Simple moving average as a flat-kernel convolution.
///
/// Output length is `values.len() - window + 1`; element `i` averages
/// `values[i..i + window]`.
pub fn moving_average(values: &[f64], window: usize) -> EngineResult<Vec<f64>> {
    validate_series(values, window)?;

    let kernel = vec![1.0 / window as f64; window];
    convolve_valid(values, &kernel)
}
