//! Account types: balances, execution reports and wallet transactions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::{OrderStatus, OrderType, ReportType, Side, TimeInForce};

/// Balance of one currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    /// Currency code.
    pub currency: String,
    /// Amount available for trading or withdrawal.
    pub available: Decimal,
    /// Amount reserved by open orders or pending withdrawals.
    pub reserved: Decimal,
}

impl Balance {
    /// Available plus reserved.
    pub fn total(&self) -> Decimal {
        self.available + self.reserved
    }
}

/// Order state as reported by the exchange.
///
/// Returned by order placement and cancellation calls and pushed on the
/// reports feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Exchange order id.
    pub id: u64,
    /// Client order id.
    pub client_order_id: String,
    /// Symbol.
    pub symbol: String,
    /// Order side.
    pub side: Side,
    /// Order status.
    pub status: OrderStatus,
    /// Order type.
    #[serde(rename = "type")]
    pub order_type: OrderType,
    /// Time in force.
    #[serde(default)]
    pub time_in_force: TimeInForce,
    /// Order quantity.
    pub quantity: Decimal,
    /// Limit price.
    #[serde(default)]
    pub price: Option<Decimal>,
    /// Executed quantity.
    #[serde(default)]
    pub cum_quantity: Decimal,
    /// Creation time.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Last update time.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    /// Why this report was emitted.
    #[serde(default)]
    pub report_type: Option<ReportType>,
    /// Quantity of the execution, for `trade` reports.
    #[serde(default)]
    pub trade_quantity: Option<Decimal>,
    /// Price of the execution, for `trade` reports.
    #[serde(default)]
    pub trade_price: Option<Decimal>,
    /// Fee charged for the execution, for `trade` reports.
    #[serde(default)]
    pub trade_fee: Option<Decimal>,
    /// Client order id this order replaced, for `replaced` reports.
    #[serde(default)]
    pub original_request_client_order_id: Option<String>,
}

impl Report {
    /// Quantity still open.
    pub fn remaining_quantity(&self) -> Decimal {
        (self.quantity - self.cum_quantity).max(Decimal::ZERO)
    }
}

/// A deposit, withdrawal or internal transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Transaction id.
    pub id: String,
    /// Monotonic transaction index.
    #[serde(default)]
    pub index: u64,
    /// Currency code.
    pub currency: String,
    /// Amount moved.
    pub amount: Decimal,
    /// Fee charged.
    #[serde(default)]
    pub fee: Option<Decimal>,
    /// Destination or source address.
    #[serde(default)]
    pub address: Option<String>,
    /// On-chain hash.
    #[serde(default)]
    pub hash: Option<String>,
    /// Transaction status (e.g. "pending", "success", "failed").
    pub status: String,
    /// Transaction type (e.g. "deposit", "withdraw").
    #[serde(rename = "type")]
    pub kind: String,
    /// Creation time.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Last update time.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_report_deserialize() {
        let json = r#"{
            "id": 4345697765,
            "clientOrderId": "53b7cf917963464a811a4af426102c19",
            "symbol": "ETHBTC",
            "side": "sell",
            "status": "partiallyFilled",
            "type": "limit",
            "timeInForce": "GTC",
            "quantity": "0.010",
            "price": "0.053868",
            "cumQuantity": "0.004",
            "createdAt": "2024-03-01T10:00:00.000Z",
            "updatedAt": "2024-03-01T10:00:05.000Z",
            "reportType": "trade",
            "tradeQuantity": "0.004",
            "tradePrice": "0.053868",
            "tradeFee": "0.000000216"
        }"#;
        let report: Report = serde_json::from_str(json).unwrap();
        assert_eq!(report.status, OrderStatus::PartiallyFilled);
        assert_eq!(report.report_type, Some(ReportType::Trade));
        assert_eq!(report.remaining_quantity(), dec!(0.006));
    }

    #[test]
    fn test_balance_total() {
        let balance = Balance {
            currency: "BTC".into(),
            available: dec!(1.5),
            reserved: dec!(0.25),
        };
        assert_eq!(balance.total(), dec!(1.75));
    }
}
