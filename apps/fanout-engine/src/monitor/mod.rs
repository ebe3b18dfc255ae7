//! Concurrent range-crossing monitor.
//!
//! Each watched item is sampled twice with a random wait before each sample.
//! The item triggers when the target lies inside the closed interval spanned
//! by the two samples. Watchers only overlap their waits, so the trigger list
//! comes back in completion order, which is not deterministic.

mod range_cross;

pub use range_cross::{Observation, PriceSampler, RangeCrossMonitor, UniformSampler, crossed};
