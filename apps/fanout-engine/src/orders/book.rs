//! Order book types and the concurrent trader simulation.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::OrderBookConfig;
use crate::error::{EngineError, EngineResult};
use crate::observability::record_order_inserted;
use crate::parallel::{Dispatcher, Task};

/// Side of the book an order rests on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Bid.
    Buy,
    /// Offer.
    Sell,
}

impl Side {
    /// Lowercase label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

/// One resting order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Book-wide unique, monotonically assigned id.
    pub id: u64,
    /// Index of the trader that placed the order.
    pub trader: usize,
    /// Limit price, two decimal places.
    pub price: Decimal,
    /// Order quantity.
    pub quantity: u32,
}

/// Final state of the simulated book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBook {
    /// Buy orders in insertion order.
    pub buy: Vec<Order>,
    /// Sell orders in insertion order.
    pub sell: Vec<Order>,
}

impl OrderBook {
    /// Orders on one side.
    #[must_use]
    pub fn side(&self, side: Side) -> &[Order] {
        match side {
            Side::Buy => &self.buy,
            Side::Sell => &self.sell,
        }
    }

    /// Total number of orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buy.len() + self.sell.len()
    }

    /// Whether the book is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every order, buys first.
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.buy.iter().chain(&self.sell)
    }

    /// All ids, sorted ascending.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.orders().map(|o| o.id).collect();
        ids.sort_unstable();
        ids
    }

    fn push(&mut self, side: Side, order: Order) {
        match side {
            Side::Buy => self.buy.push(order),
            Side::Sell => self.sell.push(order),
        }
    }
}

/// Book plus the id counter, guarded together by one lock.
#[derive(Debug, Default)]
struct BookState {
    next_id: u64,
    book: OrderBook,
}

/// Run `traders` concurrent traders, each placing `orders_per_trader` orders.
///
/// The returned book holds exactly `traders * orders_per_trader` orders whose
/// ids are `0..traders * orders_per_trader`.
pub fn simulate_traders(
    traders: usize,
    orders_per_trader: usize,
    config: &OrderBookConfig,
) -> EngineResult<OrderBook> {
    run_traders(traders, orders_per_trader, config, None)
}

/// [`simulate_traders`] with per-trader RNGs derived from `seed`.
///
/// The multiset of `(trader, side, price, quantity)` is reproducible; which
/// ids those orders receive still depends on thread interleaving.
pub fn simulate_traders_seeded(
    traders: usize,
    orders_per_trader: usize,
    config: &OrderBookConfig,
    seed: u64,
) -> EngineResult<OrderBook> {
    run_traders(traders, orders_per_trader, config, Some(seed))
}

fn run_traders(
    traders: usize,
    orders_per_trader: usize,
    config: &OrderBookConfig,
    seed: Option<u64>,
) -> EngineResult<OrderBook> {
    if traders == 0 {
        return Err(EngineError::invalid_worker_count(traders));
    }
    let (min_cents, max_cents) = price_bounds_in_cents(config)?;
    if config.min_quantity == 0 || config.min_quantity > config.max_quantity {
        return Err(EngineError::invalid_input(format!(
            "quantity range {}..={} is empty or includes zero",
            config.min_quantity, config.max_quantity
        )));
    }
    let quantities = config.min_quantity..=config.max_quantity;

    info!(traders, orders_per_trader, "Simulating traders");

    let tasks: Vec<_> = (0..traders)
        .map(|trader| {
            let quantities = quantities.clone();
            Task::new(format!("trader-{trader}"), move |state: &Mutex<BookState>| {
                let mut rng = match seed {
                    Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(trader as u64)),
                    None => StdRng::from_os_rng(),
                };

                for _ in 0..orders_per_trader {
                    let side = if rng.random_bool(0.5) { Side::Buy } else { Side::Sell };
                    let price = Decimal::new(rng.random_range(min_cents..=max_cents), 2);
                    let quantity = rng.random_range(quantities.clone());

                    let mut guard = state.lock();
                    let id = guard.next_id;
                    guard.next_id += 1;
                    guard.book.push(
                        side,
                        Order {
                            id,
                            trader,
                            price,
                            quantity,
                        },
                    );
                    drop(guard);

                    record_order_inserted(side.as_str());
                }
                Ok(())
            })
        })
        .collect();

    let state = Dispatcher::new("order_book").run(BookState::default(), tasks)?;
    info!(
        buys = state.book.buy.len(),
        sells = state.book.sell.len(),
        "Order book simulation complete"
    );
    Ok(state.book)
}

fn price_bounds_in_cents(config: &OrderBookConfig) -> EngineResult<(i64, i64)> {
    let to_cents = |price: Decimal| {
        (price * Decimal::ONE_HUNDRED)
            .round()
            .to_i64()
            .ok_or_else(|| EngineError::invalid_input(format!("price {price} is out of range")))
    };
    let min = to_cents(config.min_price)?;
    let max = to_cents(config.max_price)?;
    if min <= 0 || min > max {
        return Err(EngineError::invalid_input(format!(
            "price range {}..={} is empty or not positive",
            config.min_price, config.max_price
        )));
    }
    Ok((min, max))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_ids_are_gap_free() {
        let book = simulate_traders(4, 25, &OrderBookConfig::default()).unwrap();

        assert_eq!(book.len(), 100);
        assert_eq!(book.sorted_ids(), (0..100).collect::<Vec<u64>>());
    }

    #[test]
    fn test_prices_and_quantities_within_bounds() {
        let config = OrderBookConfig::default();
        let book = simulate_traders(3, 50, &config).unwrap();

        for order in book.orders() {
            assert!(order.price >= dec!(10) && order.price <= dec!(100));
            assert!(order.price.scale() <= 2);
            assert!((1..=100).contains(&order.quantity));
            assert!(order.trader < 3);
        }
    }

    #[test]
    fn test_ids_increase_in_insertion_order() {
        let book = simulate_traders(5, 20, &OrderBookConfig::default()).unwrap();

        for side in [Side::Buy, Side::Sell] {
            let ids: Vec<u64> = book.side(side).iter().map(|o| o.id).collect();
            assert!(ids.windows(2).all(|w| w[0] < w[1]));
        }
        for trader in 0..5 {
            assert_eq!(book.orders().filter(|o| o.trader == trader).count(), 20);
        }
    }

    #[test]
    fn test_seeded_runs_produce_same_orders() {
        let config = OrderBookConfig::default();
        let key = |book: &OrderBook| {
            let mut orders: Vec<(usize, Side, Decimal, u32)> = [Side::Buy, Side::Sell]
                .into_iter()
                .flat_map(|side| {
                    book.side(side)
                        .iter()
                        .map(move |o| (o.trader, side, o.price, o.quantity))
                })
                .collect();
            orders.sort();
            orders
        };

        let first = simulate_traders_seeded(4, 10, &config, 99).unwrap();
        let second = simulate_traders_seeded(4, 10, &config, 99).unwrap();
        assert_eq!(key(&first), key(&second));
    }

    #[test]
    fn test_zero_orders_gives_empty_book() {
        let book = simulate_traders(3, 0, &OrderBookConfig::default()).unwrap();
        assert!(book.is_empty());
    }

    #[test]
    fn test_zero_traders_rejected() {
        let err = simulate_traders(0, 5, &OrderBookConfig::default()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidWorkerCount);
    }

    #[test]
    fn test_inverted_price_range_rejected() {
        let config = OrderBookConfig {
            min_price: dec!(50),
            max_price: dec!(10),
            ..OrderBookConfig::default()
        };
        let err = simulate_traders(1, 1, &config).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInput);
    }

    #[test]
    fn test_side_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Side::Sell).unwrap(), "\"sell\"");
    }
}
