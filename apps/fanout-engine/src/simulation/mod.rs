//! Synthetic price paths used as demo and test inputs.

mod price_path;

pub use price_path::{simulate_gbm_path, simulate_random_walk};
