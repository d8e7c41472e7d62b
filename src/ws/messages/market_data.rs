//! Market data subscription parameters and notification payloads.

use serde::{Deserialize, Serialize};

use crate::types::{BookSpeed, Candle, Period, Trade};

/// Parameters naming a single symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolParams {
    /// Trading pair symbol.
    pub symbol: String,
}

impl SymbolParams {
    /// Create parameters for `symbol`.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
        }
    }
}

/// Trades subscription parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradesParams {
    /// Trading pair symbol.
    pub symbol: String,
    /// Number of trades in the initial snapshot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl TradesParams {
    /// Create trades parameters.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            limit: None,
        }
    }

    /// Set the snapshot size.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Candles subscription parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandlesParams {
    /// Trading pair symbol.
    pub symbol: String,
    /// Candle period.
    pub period: Period,
    /// Number of candles in the initial snapshot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl CandlesParams {
    /// Create candles parameters.
    pub fn new(symbol: impl Into<String>, period: Period) -> Self {
        Self {
            symbol: symbol.into(),
            period,
            limit: None,
        }
    }

    /// Set the snapshot size.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Order book top subscription parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderBookTopParams {
    /// Trading pair symbol.
    pub symbol: String,
    /// Number of levels per side.
    pub depth: u32,
    /// Push interval.
    pub speed: BookSpeed,
}

impl OrderBookTopParams {
    /// Create order book top parameters.
    pub fn new(symbol: impl Into<String>, depth: u32, speed: BookSpeed) -> Self {
        Self {
            symbol: symbol.into(),
            depth,
            speed,
        }
    }
}

/// Payload of `snapshotTrades` / `updateTrades`.
#[derive(Debug, Clone, Deserialize)]
pub struct TradesPayload {
    /// Trading pair symbol.
    pub symbol: String,
    /// Trades in exchange order.
    #[serde(default)]
    pub data: Vec<Trade>,
}

/// Payload of `snapshotCandles` / `updateCandles`.
#[derive(Debug, Clone, Deserialize)]
pub struct CandlesPayload {
    /// Trading pair symbol.
    pub symbol: String,
    /// Candle period.
    pub period: Period,
    /// Candles, oldest first.
    #[serde(default)]
    pub data: Vec<Candle>,
}
