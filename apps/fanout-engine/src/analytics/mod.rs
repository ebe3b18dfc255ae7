//! Parallel numeric analytics.
//!
//! - [`parallel_moving_averages`]: one unit per named series, locked insert
//! - [`parallel_volatility`]: balanced split of the output window positions,
//!   disjoint writes

mod moving_average;
mod volatility;

pub use moving_average::parallel_moving_averages;
pub use volatility::{parallel_rolling_std, parallel_volatility};
