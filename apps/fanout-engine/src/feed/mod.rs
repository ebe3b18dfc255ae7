//! Simulated concurrent price feeds.

mod price_feed;

pub use price_feed::{PriceFeedSimulator, PriceSnapshot};
