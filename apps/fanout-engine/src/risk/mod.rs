//! Bounded-capacity risk allocation.
//!
//! Strategies compete for a single pool of risk capacity. Each request is
//! polled by its own worker until it fits or the shared deadline passes.
//!
//! # Fairness
//!
//! None. Requests are not served in arrival order; whichever poller observes
//! enough capacity first wins, and a large request can starve behind smaller
//! ones. This is accepted behavior.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use fanout_engine::risk::allocate_risk;
//! use rust_decimal_macros::dec;
//!
//! let granted = allocate_risk(
//!     dec!(100),
//!     &[("A", dec!(40)), ("B", dec!(40)), ("C", dec!(40))],
//!     Duration::from_secs(2),
//! )
//! .unwrap();
//! assert_eq!(granted.len(), 2);
//! ```

mod allocator;

pub use allocator::{
    AllocationReport, AllocationRequest, AllocationStatus, RiskAllocator, allocate_risk,
};
