//! Prometheus metrics for the fan-out engine.
//!
//! # Example
//!
//! ```ignore
//! use fanout_engine::observability::{init_metrics, record_unit_completed, MetricsConfig};
//!
//! init_metrics(&MetricsConfig::default()).expect("Failed to initialize metrics");
//! record_unit_completed("volatility", true, 0.002);
//! ```

use std::net::SocketAddr;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Configuration for the metrics exporter.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Address to bind the metrics HTTP listener.
    pub listen_addr: SocketAddr,
    /// Histogram buckets for unit durations (in seconds).
    pub latency_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 9090)),
            // Latency buckets from 10us to 5s
            latency_buckets: vec![
                0.000_01, 0.000_1, 0.001, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
            ],
        }
    }
}

impl MetricsConfig {
    /// Create a new metrics configuration with custom address.
    #[must_use]
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            listen_addr: addr,
            ..Default::default()
        }
    }
}

/// Error type for metrics operations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Failed to configure metrics exporter.
    #[error("metrics configuration error: {0}")]
    Configuration(String),
    /// Failed to install metrics exporter.
    #[error("metrics installation error: {0}")]
    Installation(String),
}

/// Initialize the Prometheus metrics exporter.
///
/// This starts an HTTP listener that exposes metrics at `/metrics`.
///
/// # Errors
///
/// Returns an error if the exporter fails to start (e.g., port already in use).
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(config.listen_addr)
        .set_buckets(&config.latency_buckets)
        .map_err(|e| MetricsError::Configuration(e.to_string()))?
        .install()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    tracing::info!(addr = %config.listen_addr, "Prometheus metrics exporter started");

    Ok(())
}

/// Record the completion of one work unit.
///
/// # Arguments
///
/// * `call_site` - Which helper ran the unit (e.g., "volatility", "moving_average")
/// * `success` - Whether the unit's function succeeded
/// * `seconds` - Wall-clock time the unit took
pub fn record_unit_completed(call_site: &str, success: bool, seconds: f64) {
    counter!(
        "fanout_units_total",
        "call_site" => call_site.to_string(),
        "status" => if success { "ok" } else { "failed" }
    )
    .increment(1);

    histogram!("fanout_unit_seconds", "call_site" => call_site.to_string()).record(seconds);
}

/// Record a terminal allocation outcome ("granted" or "timed_out").
pub fn record_allocation(status: &str) {
    counter!("risk_allocations_total", "status" => status.to_string()).increment(1);
}

/// Record an order appended to the book.
pub fn record_order_inserted(side: &str) {
    counter!("orders_inserted_total", "side" => side.to_string()).increment(1);
}

/// Record a monitored item whose interval contained the target.
pub fn record_monitor_trigger() {
    counter!("monitor_triggers_total").increment(1);
}

/// Record a simulated price update.
pub fn record_feed_update(symbol: &str) {
    counter!("feed_updates_total", "symbol" => symbol.to_string()).increment(1);
}
