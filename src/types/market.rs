//! Market data types shared by the REST and WebSocket APIs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::Side;

/// Trading symbol definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Symbol {
    /// Symbol identifier (e.g. "ETHBTC").
    pub id: String,
    /// Base currency code.
    pub base_currency: String,
    /// Quote currency code.
    pub quote_currency: String,
    /// Minimum order quantity step.
    pub quantity_increment: Decimal,
    /// Minimum price step.
    pub tick_size: Decimal,
    /// Taker fee rate.
    #[serde(default)]
    pub take_liquidity_rate: Option<Decimal>,
    /// Maker fee rate.
    #[serde(default)]
    pub provide_liquidity_rate: Option<Decimal>,
    /// Currency the fee is charged in.
    #[serde(default)]
    pub fee_currency: Option<String>,
}

/// 24h ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker {
    /// Symbol.
    pub symbol: String,
    /// Best ask price.
    #[serde(default)]
    pub ask: Option<Decimal>,
    /// Best bid price.
    #[serde(default)]
    pub bid: Option<Decimal>,
    /// Last trade price.
    #[serde(default)]
    pub last: Option<Decimal>,
    /// Price 24h ago.
    #[serde(default)]
    pub open: Option<Decimal>,
    /// 24h low.
    #[serde(default)]
    pub low: Option<Decimal>,
    /// 24h high.
    #[serde(default)]
    pub high: Option<Decimal>,
    /// 24h volume in base currency.
    pub volume: Decimal,
    /// 24h volume in quote currency.
    pub volume_quote: Decimal,
    /// Time of the last update.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// A public trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Trade id.
    pub id: u64,
    /// Trade price.
    pub price: Decimal,
    /// Trade quantity.
    pub quantity: Decimal,
    /// Taker side.
    pub side: Side,
    /// Trade time.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// A candlestick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candle {
    /// Interval start.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Open price.
    pub open: Decimal,
    /// Close price.
    pub close: Decimal,
    /// Lowest price.
    pub min: Decimal,
    /// Highest price.
    pub max: Decimal,
    /// Volume in base currency.
    pub volume: Decimal,
    /// Volume in quote currency.
    pub volume_quote: Decimal,
}

/// One price level of an order book side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    /// Level price.
    pub price: Decimal,
    /// Total size resting at the price. Zero in a diff deletes the level.
    pub size: Decimal,
}

impl PriceLevel {
    /// Create a new level.
    pub fn new(price: Decimal, size: Decimal) -> Self {
        Self { price, size }
    }
}

/// A materialized order book.
///
/// `ask` is sorted ascending by price, `bid` descending by price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    /// Symbol.
    pub symbol: String,
    /// Sequence number of the last applied message.
    #[serde(default)]
    pub sequence: u64,
    /// Time of the last applied message.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Ask levels, best (lowest) first.
    #[serde(default)]
    pub ask: Vec<PriceLevel>,
    /// Bid levels, best (highest) first.
    #[serde(default)]
    pub bid: Vec<PriceLevel>,
}

impl OrderBook {
    /// Best ask level.
    pub fn best_ask(&self) -> Option<&PriceLevel> {
        self.ask.first()
    }

    /// Best bid level.
    pub fn best_bid(&self) -> Option<&PriceLevel> {
        self.bid.first()
    }

    /// Difference between best ask and best bid.
    pub fn spread(&self) -> Option<Decimal> {
        Some(self.best_ask()?.price - self.best_bid()?.price)
    }

    /// Whether the best bid is at or above the best ask.
    pub fn is_crossed(&self) -> bool {
        self.spread().is_some_and(|spread| spread <= Decimal::ZERO)
    }
}
