//! Integration tests for the lock-protected call sites: order book, risk
//! allocator, and range monitor.
//!
//! Interleavings are nondeterministic, so accumulator outputs are compared
//! as sets.

use std::collections::BTreeSet;
use std::time::Duration;

use fanout_engine::config::{AllocatorConfig, MonitorConfig, OrderBookConfig};
use fanout_engine::monitor::{PriceSampler, RangeCrossMonitor};
use fanout_engine::risk::{AllocationRequest, AllocationStatus, RiskAllocator, allocate_risk};
use fanout_engine::{Side, simulate_traders};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use test_case::test_case;

// =============================================================================
// Order book
// =============================================================================

#[test_case(1, 1)]
#[test_case(1, 5)]
#[test_case(1, 20)]
#[test_case(5, 1)]
#[test_case(5, 5)]
#[test_case(5, 20)]
#[test_case(20, 1)]
#[test_case(20, 5)]
#[test_case(20, 20)]
fn test_order_ids_are_gap_free(traders: usize, orders_per_trader: usize) {
    let book = simulate_traders(traders, orders_per_trader, &OrderBookConfig::default()).unwrap();

    let expected: Vec<u64> = (0..(traders * orders_per_trader) as u64).collect();
    assert_eq!(book.len(), traders * orders_per_trader);
    assert_eq!(book.sorted_ids(), expected);
}

#[test]
fn test_orders_respect_configured_bounds() {
    let config = OrderBookConfig {
        min_price: dec!(20.50),
        max_price: dec!(21.00),
        min_quantity: 3,
        max_quantity: 4,
    };
    let book = simulate_traders(4, 25, &config).unwrap();

    for side in [Side::Buy, Side::Sell] {
        for order in book.side(side) {
            assert!(order.price >= config.min_price && order.price <= config.max_price);
            assert!(order.price.scale() <= 2);
            assert!((3..=4).contains(&order.quantity));
            assert!(order.trader < 4);
        }
    }
}

// =============================================================================
// Risk allocator
// =============================================================================

#[test]
fn test_oversubscribed_pool_grants_exactly_two() {
    let granted = allocate_risk(
        dec!(100),
        &[("A", dec!(40)), ("B", dec!(40)), ("C", dec!(40))],
        Duration::from_secs(2),
    )
    .unwrap();

    assert_eq!(granted.len(), 2);
    assert!(granted.values().all(|amount| *amount == dec!(40)));
}

#[test]
fn test_pool_that_fits_grants_everything() {
    let config = AllocatorConfig {
        poll_interval_ms: 5,
        deadline_ms: 500,
    };
    let requests: Vec<AllocationRequest> = (0..10)
        .map(|i| AllocationRequest::new(format!("S{i}"), Decimal::from(i + 1)))
        .collect();

    let report = RiskAllocator::new(dec!(55), config)
        .unwrap()
        .allocate(&requests)
        .unwrap();

    assert_eq!(report.granted.len(), 10);
    assert_eq!(report.remaining_capacity, Decimal::ZERO);
    assert!(
        report
            .statuses
            .values()
            .all(|status| *status == AllocationStatus::Granted)
    );
}

#[test]
fn test_remaining_capacity_never_negative() {
    let config = AllocatorConfig {
        poll_interval_ms: 2,
        deadline_ms: 100,
    };
    let requests: Vec<AllocationRequest> = (0..16)
        .map(|i| AllocationRequest::new(format!("S{i}"), dec!(7.5)))
        .collect();

    let report = RiskAllocator::new(dec!(50), config)
        .unwrap()
        .allocate(&requests)
        .unwrap();

    // 50 / 7.5 = 6.67, so six fit.
    assert_eq!(report.granted.len(), 6);
    assert_eq!(report.timed_out().len(), 10);
    assert!(report.remaining_capacity >= Decimal::ZERO);
    assert_eq!(report.remaining_capacity, dec!(5));
}

// =============================================================================
// Range monitor
// =============================================================================

/// Prices derived from the item name so every call is reproducible.
struct NamedSampler;

impl PriceSampler for NamedSampler {
    fn sample(&self, item: &str) -> f64 {
        match item {
            "low" => 90.0,
            "high" => 110.0,
            "exact" => 100.0,
            _ => 0.0,
        }
    }
}

#[test]
fn test_monitor_compares_as_set() {
    let config = MonitorConfig {
        min_delay_ms: 1,
        max_delay_ms: 3,
        ..MonitorConfig::default()
    };
    let monitor = RangeCrossMonitor::new(config, NamedSampler).unwrap();

    let hits: BTreeSet<String> = monitor
        .watch(&["low", "high", "exact", "other"], 100.0)
        .unwrap()
        .into_iter()
        .collect();

    // Constant samples only cross when they sit exactly on the target.
    assert_eq!(hits, BTreeSet::from(["exact".to_string()]));
}
