//! Observability module for logging and metrics.
//!
//! Logging goes through `tracing`; counters and histograms go through the
//! `metrics` facade and are exported to Prometheus when the binary enables it.

mod logging;
mod metrics;

pub use logging::{TracingError, init_tracing};
pub use self::metrics::{
    MetricsConfig, MetricsError, init_metrics, record_allocation, record_feed_update,
    record_monitor_trigger, record_order_inserted, record_unit_completed,
};
