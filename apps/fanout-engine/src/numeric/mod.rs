//! Single-threaded numeric kernels.
//!
//! These are the pure per-unit functions the parallel call sites invoke, and
//! the references their results are checked against.
//!
//! # Example
//!
//! ```rust
//! use fanout_engine::numeric::moving_average;
//!
//! let averages = moving_average(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0], 3).unwrap();
//! assert_eq!(averages.len(), 4);
//! assert!((averages[0] - 11.0).abs() < 1e-9);
//! ```

mod returns;
mod stats;
mod window;

pub use returns::{log_returns, simple_returns};
pub use stats::{mean, population_std_dev, rolling_std, window_std};
pub use window::{convolve_valid, moving_average, validate_series, validate_window};
