//! Simulated order book price and quantity ranges.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Order book simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBookConfig {
    /// Lowest limit price.
    #[serde(default = "default_min_price")]
    pub min_price: Decimal,
    /// Highest limit price.
    #[serde(default = "default_max_price")]
    pub max_price: Decimal,
    /// Smallest order quantity.
    #[serde(default = "default_min_quantity")]
    pub min_quantity: u32,
    /// Largest order quantity.
    #[serde(default = "default_max_quantity")]
    pub max_quantity: u32,
}

impl Default for OrderBookConfig {
    fn default() -> Self {
        Self {
            min_price: default_min_price(),
            max_price: default_max_price(),
            min_quantity: default_min_quantity(),
            max_quantity: default_max_quantity(),
        }
    }
}

fn default_min_price() -> Decimal {
    dec!(10)
}

fn default_max_price() -> Decimal {
    dec!(100)
}

const fn default_min_quantity() -> u32 {
    1
}

const fn default_max_quantity() -> u32 {
    100
}
