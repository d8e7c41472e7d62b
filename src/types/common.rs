//! Common domain enums shared by the REST and WebSocket APIs.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Buy or sell side of an order or trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy order
    Buy,
    /// Sell order
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// Order type for trading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderType {
    /// Limit order - execute at specified price or better
    #[default]
    Limit,
    /// Market order - execute immediately at best available price
    Market,
    /// Limit order placed once the stop price is reached
    StopLimit,
    /// Market order placed once the stop price is reached
    StopMarket,
}

/// Status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderStatus {
    /// Accepted and resting on the book
    New,
    /// Stop order waiting for its trigger
    Suspended,
    /// Order has been partially filled
    PartiallyFilled,
    /// Order has been completely filled
    Filled,
    /// Order has been canceled
    Canceled,
    /// Order has expired
    Expired,
}

impl OrderStatus {
    /// Whether the order can still trade.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            OrderStatus::New | OrderStatus::Suspended | OrderStatus::PartiallyFilled
        )
    }
}

/// Time in force for orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good till canceled (default)
    #[default]
    GTC,
    /// Immediate or cancel - fill what's possible immediately, cancel rest
    IOC,
    /// Fill or kill - fill completely or cancel
    FOK,
    /// Good for the current trading day
    Day,
    /// Good till date - order expires at specified time
    GTD,
}

/// Why an execution report was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReportType {
    /// Snapshot of an existing order
    Status,
    /// Order accepted
    New,
    /// Order canceled
    Canceled,
    /// Order rejected
    Rejected,
    /// Order expired
    Expired,
    /// Stop order suspended
    Suspended,
    /// Order (partially) executed
    Trade,
    /// Order replaced
    Replaced,
}

/// Candle period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    /// 1 minute
    M1,
    /// 3 minutes
    M3,
    /// 5 minutes
    M5,
    /// 15 minutes
    M15,
    /// 30 minutes (default)
    #[default]
    M30,
    /// 1 hour
    H1,
    /// 4 hours
    H4,
    /// 1 day
    D1,
    /// 7 days
    D7,
    /// 1 month
    #[serde(rename = "1M")]
    Month1,
}

impl Period {
    /// Wire representation of the period.
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::M1 => "M1",
            Period::M3 => "M3",
            Period::M5 => "M5",
            Period::M15 => "M15",
            Period::M30 => "M30",
            Period::H1 => "H1",
            Period::H4 => "H4",
            Period::D1 => "D1",
            Period::D7 => "D7",
            Period::Month1 => "1M",
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M1" => Ok(Period::M1),
            "M3" => Ok(Period::M3),
            "M5" => Ok(Period::M5),
            "M15" => Ok(Period::M15),
            "M30" => Ok(Period::M30),
            "H1" => Ok(Period::H1),
            "H4" => Ok(Period::H4),
            "D1" => Ok(Period::D1),
            "D7" => Ok(Period::D7),
            "1M" => Ok(Period::Month1),
            _ => Err(format!("Invalid candle period: {}", s)),
        }
    }
}

/// Publication speed of a partial order book feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookSpeed {
    /// Every 100 milliseconds
    #[default]
    #[serde(rename = "100ms")]
    Ms100,
    /// Every 500 milliseconds
    #[serde(rename = "500ms")]
    Ms500,
    /// Every second
    #[serde(rename = "1000ms")]
    Ms1000,
}

impl BookSpeed {
    /// Wire representation of the speed.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookSpeed::Ms100 => "100ms",
            BookSpeed::Ms500 => "500ms",
            BookSpeed::Ms1000 => "1000ms",
        }
    }
}

impl std::fmt::Display for BookSpeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
