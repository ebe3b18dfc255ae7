//! Inputs for the demo binary's scenarios.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// A named risk request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StrategySpec {
    /// Strategy name.
    pub name: String,
    /// Requested risk.
    pub risk: Decimal,
}

/// Demo scenario configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Symbols to simulate, monitor, and feed.
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    /// Days per simulated price path.
    #[serde(default = "default_days")]
    pub days: usize,
    /// Seed for the simulated paths; random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Traders in the order book scenario.
    #[serde(default = "default_traders")]
    pub traders: usize,
    /// Orders placed by each trader.
    #[serde(default = "default_orders_per_trader")]
    pub orders_per_trader: usize,
    /// Total risk capacity for the allocator scenario.
    #[serde(default = "default_total_risk")]
    pub total_risk: Decimal,
    /// Risk requests for the allocator scenario.
    #[serde(default = "default_strategies")]
    pub strategies: Vec<StrategySpec>,
    /// Target price for the monitor scenario.
    #[serde(default = "default_target_price")]
    pub target_price: f64,
    /// How long the price feed scenario runs, in milliseconds.
    #[serde(default = "default_feed_duration_ms")]
    pub feed_duration_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            days: default_days(),
            seed: None,
            traders: default_traders(),
            orders_per_trader: default_orders_per_trader(),
            total_risk: default_total_risk(),
            strategies: default_strategies(),
            target_price: default_target_price(),
            feed_duration_ms: default_feed_duration_ms(),
        }
    }
}

fn default_symbols() -> Vec<String> {
    ["PETR4", "VALE3", "ITUB4", "B3SA3"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

const fn default_days() -> usize {
    250
}

const fn default_traders() -> usize {
    5
}

const fn default_orders_per_trader() -> usize {
    10
}

fn default_total_risk() -> Decimal {
    dec!(100)
}

fn default_strategies() -> Vec<StrategySpec> {
    ["A", "B", "C"]
        .into_iter()
        .map(|name| StrategySpec {
            name: name.to_string(),
            risk: dec!(40),
        })
        .collect()
}

const fn default_target_price() -> f64 {
    100.0
}

const fn default_feed_duration_ms() -> u64 {
    10_000
}
