//! Configuration module for the fan-out engine.
//!
//! Loads a YAML file with `${VAR}` / `${VAR:-default}` environment variable
//! interpolation, then validates it. Every section has defaults, so an empty
//! document is a valid configuration.
//!
//! # Usage
//!
//! ```rust,ignore
//! use fanout_engine::config::load_config;
//!
//! // Load from default path (fanout.yaml)
//! let config = load_config(None)?;
//! println!("workers: {}", config.executor.workers);
//! ```

mod allocator;
mod demo;
mod executor;
mod feed;
mod monitor;
mod observability;
mod order_book;

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use allocator::AllocatorConfig;
pub use demo::{DemoConfig, StrategySpec};
pub use executor::ExecutorConfig;
pub use feed::FeedConfig;
pub use monitor::MonitorConfig;
pub use observability::{LoggingConfig, MetricsSettings, ObservabilityConfig};
pub use order_book::OrderBookConfig;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "fanout.yaml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Partitioned executor configuration.
    #[serde(default)]
    pub executor: ExecutorConfig,
    /// Risk allocator configuration.
    #[serde(default)]
    pub allocator: AllocatorConfig,
    /// Range-crossing monitor configuration.
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// Price feed simulator configuration.
    #[serde(default)]
    pub feed: FeedConfig,
    /// Order book simulator configuration.
    #[serde(default)]
    pub order_book: OrderBookConfig,
    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
    /// Demo binary scenarios.
    #[serde(default)]
    pub demo: DemoConfig,
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to [`DEFAULT_CONFIG_PATH`].
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or(DEFAULT_CONFIG_PATH);

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = if interpolated.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml_bw::from_str(&interpolated)?
    };
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // constant pattern
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map(|m| m.as_str());
        match std::env::var(&cap[1]) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.map_or_else(String::new, str::to_string),
        }
    })
    .into_owned()
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let executor = &config.executor;
    if executor.workers == 0 {
        return Err(invalid("executor.workers must be positive"));
    }
    if executor.window == 0 {
        return Err(invalid("executor.window must be positive"));
    }
    if executor.ddof >= executor.window {
        return Err(invalid("executor.ddof must be smaller than executor.window"));
    }

    if config.allocator.poll_interval_ms == 0 {
        return Err(invalid("allocator.poll_interval_ms must be positive"));
    }

    let monitor = &config.monitor;
    if monitor.min_delay_ms > monitor.max_delay_ms {
        return Err(invalid("monitor.min_delay_ms must not exceed monitor.max_delay_ms"));
    }
    if !(monitor.price_low.is_finite() && monitor.price_high.is_finite())
        || monitor.price_low >= monitor.price_high
    {
        return Err(invalid("monitor.price_low must be below monitor.price_high"));
    }

    let feed = &config.feed;
    if feed.min_update_ms > feed.max_update_ms {
        return Err(invalid("feed.min_update_ms must not exceed feed.max_update_ms"));
    }
    if feed.report_interval_ms == 0 {
        return Err(invalid("feed.report_interval_ms must be positive"));
    }
    if !(feed.initial_price_low.is_finite() && feed.initial_price_high.is_finite())
        || feed.initial_price_low >= feed.initial_price_high
    {
        return Err(invalid(
            "feed.initial_price_low must be below feed.initial_price_high",
        ));
    }
    if !feed.max_step.is_finite() || feed.max_step <= 0.0 {
        return Err(invalid("feed.max_step must be positive"));
    }

    let book = &config.order_book;
    if book.min_price <= rust_decimal::Decimal::ZERO || book.min_price >= book.max_price {
        return Err(invalid(
            "order_book.min_price must be positive and below order_book.max_price",
        ));
    }
    if book.min_quantity == 0 || book.min_quantity > book.max_quantity {
        return Err(invalid(
            "order_book.min_quantity must be positive and not exceed order_book.max_quantity",
        ));
    }

    let logging = &config.observability.logging;
    let valid_formats = ["json", "pretty"];
    if !valid_formats.contains(&logging.format.as_str()) {
        return Err(invalid(format!(
            "observability.logging.format must be one of: {valid_formats:?}"
        )));
    }
    if config
        .observability
        .metrics
        .listen_addr
        .parse::<SocketAddr>()
        .is_err()
    {
        return Err(invalid(
            "observability.metrics.listen_addr must be a socket address",
        ));
    }

    if config.demo.total_risk < rust_decimal::Decimal::ZERO {
        return Err(invalid("demo.total_risk must not be negative"));
    }

    Ok(())
}
