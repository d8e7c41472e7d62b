//! Common types used across the client library.

pub mod account;
pub mod common;
pub mod market;

pub use account::{Balance, Report, Transaction};
pub use common::*;
pub use market::{Candle, OrderBook, PriceLevel, Symbol, Ticker, Trade};
