//! Simulated multi-trader order book.
//!
//! Traders run concurrently and append orders to a shared book. Order ids
//! come from one counter that is only read and incremented under the book's
//! lock, so ids are unique and gap-free across all traders. The order in
//! which traders interleave is unspecified.

mod book;

pub use book::{Order, OrderBook, Side, simulate_traders, simulate_traders_seeded};
