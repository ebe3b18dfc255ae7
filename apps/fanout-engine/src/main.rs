//! Fan-out Engine Binary
//!
//! Runs every fan-out/fan-in call site once on generated data and logs each
//! result as JSON.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin fanout-engine
//! ```
//!
//! # Environment Variables
//!
//! - `FANOUT_CONFIG`: Path to the YAML config (default: fanout.yaml; built-in
//!   defaults when the file is missing)
//! - `RUST_LOG`: Log filter, overrides `observability.logging.level`

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use fanout_engine::config::{self, Config, ConfigError, DEFAULT_CONFIG_PATH};
use fanout_engine::feed::PriceFeedSimulator;
use fanout_engine::monitor::{RangeCrossMonitor, UniformSampler};
use fanout_engine::numeric::log_returns;
use fanout_engine::observability::{MetricsConfig, init_metrics, init_tracing};
use fanout_engine::orders::{simulate_traders, simulate_traders_seeded};
use fanout_engine::risk::{AllocationRequest, RiskAllocator};
use fanout_engine::simulation::simulate_gbm_path;
use fanout_engine::{parallel_moving_averages, parallel_rolling_std};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{info, warn};

// Generated daily price paths.
const PATH_MU: f64 = 0.0005;
const PATH_SIGMA: f64 = 0.02;
const PATH_INITIAL_PRICE: f64 = 100.0;

fn main() -> anyhow::Result<()> {
    load_dotenv();

    let config = load_config()?;
    init_tracing(&config.observability.logging).context("failed to initialize tracing")?;
    if let Err(e) = init_metrics_from_config(&config) {
        warn!(error = %e, "Metrics exporter disabled");
    }

    info!("Starting fan-out engine demo");

    let paths = generate_paths(&config)?;
    run_analytics(&config, &paths)?;
    run_order_book(&config)?;
    run_risk_allocation(&config)?;
    run_monitor(&config)?;
    run_price_feed(&config)?;

    info!("Fan-out engine demo complete");
    Ok(())
}

/// Load `.env` from the working directory or the nearest ancestor.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Read the config file, falling back to defaults when the default path is absent.
fn load_config() -> anyhow::Result<Config> {
    let explicit = std::env::var("FANOUT_CONFIG").ok();
    match config::load_config(explicit.as_deref()) {
        Ok(config) => Ok(config),
        Err(ConfigError::ReadError { path, .. }) if explicit.is_none() => {
            eprintln!("{path} not found, using built-in defaults");
            Ok(Config::default())
        }
        Err(e) => Err(e).with_context(|| {
            format!(
                "failed to load {}",
                explicit.as_deref().unwrap_or(DEFAULT_CONFIG_PATH)
            )
        }),
    }
}

fn init_metrics_from_config(config: &Config) -> anyhow::Result<()> {
    let settings = &config.observability.metrics;
    if !settings.enabled {
        return Ok(());
    }
    let addr: SocketAddr = settings
        .listen_addr
        .parse()
        .with_context(|| format!("invalid metrics address {}", settings.listen_addr))?;
    init_metrics(&MetricsConfig::with_addr(addr))?;
    info!(%addr, "Metrics exporter listening");
    Ok(())
}

fn log_result<T: Serialize>(scenario: &str, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string(value)?;
    info!(scenario, result = %json, "Scenario result");
    Ok(())
}

fn generate_paths(config: &Config) -> anyhow::Result<BTreeMap<String, Vec<f64>>> {
    let demo = &config.demo;
    let mut rng = demo
        .seed
        .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);

    demo.symbols
        .iter()
        .map(|symbol| {
            let path = simulate_gbm_path(PATH_INITIAL_PRICE, PATH_MU, PATH_SIGMA, demo.days, &mut rng)?;
            Ok::<_, anyhow::Error>((symbol.clone(), path))
        })
        .collect()
}

fn run_analytics(config: &Config, paths: &BTreeMap<String, Vec<f64>>) -> anyhow::Result<()> {
    let executor = &config.executor;

    let averages = parallel_moving_averages(paths, executor.window, executor.workers)
        .context("moving average scenario failed")?;
    let latest: BTreeMap<&str, Option<f64>> = averages
        .iter()
        .map(|(symbol, values)| (symbol.as_str(), values.last().copied()))
        .collect();
    log_result("moving_average", &latest)?;

    let mut volatility = BTreeMap::new();
    for (symbol, path) in paths {
        let returns = log_returns(path)?;
        let rolling = parallel_rolling_std(&returns, executor.window, executor.ddof, executor.workers)
            .with_context(|| format!("volatility scenario failed for {symbol}"))?;
        volatility.insert(symbol.as_str(), rolling.last().copied());
    }
    log_result("volatility", &volatility)
}

fn run_order_book(config: &Config) -> anyhow::Result<()> {
    let demo = &config.demo;
    let book = match demo.seed {
        Some(seed) => simulate_traders_seeded(
            demo.traders,
            demo.orders_per_trader,
            &config.order_book,
            seed,
        ),
        None => simulate_traders(demo.traders, demo.orders_per_trader, &config.order_book),
    }
    .context("order book scenario failed")?;

    info!(
        buy = book.buy.len(),
        sell = book.sell.len(),
        "Order book filled"
    );
    log_result("order_book", &book)
}

fn run_risk_allocation(config: &Config) -> anyhow::Result<()> {
    let demo = &config.demo;
    let requests: Vec<AllocationRequest> = demo
        .strategies
        .iter()
        .map(|strategy| AllocationRequest::new(strategy.name.clone(), strategy.risk))
        .collect();

    let report = RiskAllocator::new(demo.total_risk, config.allocator.clone())?
        .allocate(&requests)
        .context("risk allocation scenario failed")?;
    log_result("risk_allocation", &report)
}

fn run_monitor(config: &Config) -> anyhow::Result<()> {
    let sampler = UniformSampler::from_config(&config.monitor)?;
    let monitor = RangeCrossMonitor::new(config.monitor.clone(), sampler)?;

    let triggered = monitor
        .watch(&config.demo.symbols, config.demo.target_price)
        .context("range monitor scenario failed")?;
    log_result("range_monitor", &triggered)
}

fn run_price_feed(config: &Config) -> anyhow::Result<()> {
    let mut simulator = PriceFeedSimulator::new(config.feed.clone())?;
    if let Some(seed) = config.demo.seed {
        simulator = simulator.with_seed(seed);
    }

    let snapshot = simulator
        .run(
            &config.demo.symbols,
            Duration::from_millis(config.demo.feed_duration_ms),
        )
        .context("price feed scenario failed")?;
    log_result("price_feed", &snapshot)
}
