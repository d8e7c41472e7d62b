//! Feed families, feed keys and notification routing.

use std::fmt;

use crate::types::BookSpeed;
use crate::ws::messages::{Notification, methods};

/// Key identifying one logical push feed on a session.
///
/// Formatted as `family:SYMBOL:qualifier`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeedKey(String);

impl FeedKey {
    /// The key as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The kinds of push feed the exchange offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedFamily {
    /// Public trades.
    Trades,
    /// Candlesticks.
    Candles,
    /// 24h ticker.
    Ticker,
    /// Full order book (snapshot + diffs).
    OrderBook,
    /// Periodic top-of-book snapshots.
    OrderBookTop,
    /// Order execution reports.
    Reports,
    /// Account balances.
    Balances,
    /// Wallet transactions.
    Transactions,
}

impl FeedFamily {
    /// Short name used as the key prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedFamily::Trades => "trades",
            FeedFamily::Candles => "candles",
            FeedFamily::Ticker => "ticker",
            FeedFamily::OrderBook => "orderbook",
            FeedFamily::OrderBookTop => "orderbooktop",
            FeedFamily::Reports => "reports",
            FeedFamily::Balances => "balances",
            FeedFamily::Transactions => "transactions",
        }
    }

    /// Whether the family carries one feed per account rather than per symbol.
    pub fn is_account_wide(&self) -> bool {
        matches!(
            self,
            FeedFamily::Reports | FeedFamily::Balances | FeedFamily::Transactions
        )
    }

    /// Derive the key for `symbol` and an optional qualifier (period, depth/speed).
    ///
    /// Symbols are trimmed and upper-cased; an empty symbol and `*` both mean
    /// "all symbols".
    pub fn key(&self, symbol: &str, qualifier: Option<&str>) -> FeedKey {
        let symbol = symbol.trim();
        let symbol = if symbol.is_empty() || symbol == "*" {
            "*".to_string()
        } else {
            symbol.to_uppercase()
        };
        FeedKey(format!(
            "{}:{}:{}",
            self.as_str(),
            symbol,
            qualifier.unwrap_or_default()
        ))
    }

    /// Key of an account-wide feed.
    pub fn account_key(&self) -> FeedKey {
        self.key("*", None)
    }

    /// The family a notification method belongs to.
    pub fn from_notification(method: &str) -> Option<Self> {
        match method {
            methods::SNAPSHOT_TRADES | methods::UPDATE_TRADES => Some(FeedFamily::Trades),
            methods::SNAPSHOT_CANDLES | methods::UPDATE_CANDLES => Some(FeedFamily::Candles),
            methods::TICKER => Some(FeedFamily::Ticker),
            methods::SNAPSHOT_ORDERBOOK | methods::UPDATE_ORDERBOOK => Some(FeedFamily::OrderBook),
            methods::ORDERBOOK_TOP => Some(FeedFamily::OrderBookTop),
            methods::ACTIVE_ORDERS | methods::REPORT => Some(FeedFamily::Reports),
            methods::BALANCE => Some(FeedFamily::Balances),
            methods::UPDATE_TRANSACTION => Some(FeedFamily::Transactions),
            _ => None,
        }
    }
}

impl fmt::Display for FeedFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Qualifier of an order book top feed.
pub fn top_qualifier(depth: u64, speed: &str) -> String {
    format!("D{}@{}", depth, speed)
}

/// Qualifier of an order book top feed from typed parameters.
pub fn top_qualifier_for(depth: u32, speed: BookSpeed) -> String {
    top_qualifier(u64::from(depth), speed.as_str())
}

/// Maps an inbound notification to the feed it belongs to.
pub trait FeedRouter: Send + Sync + 'static {
    /// The key of the feed for `notification`, or `None` to drop it.
    fn route(&self, notification: &Notification) -> Option<FeedKey>;
}

/// Router for the exchange's notification methods.
#[derive(Debug, Clone, Copy, Default)]
pub struct FamilyRouter;

impl FeedRouter for FamilyRouter {
    fn route(&self, notification: &Notification) -> Option<FeedKey> {
        let family = FeedFamily::from_notification(&notification.method)?;
        if family.is_account_wide() {
            return Some(family.account_key());
        }

        let symbol = notification.str_param("symbol")?;
        let key = match family {
            FeedFamily::Candles => family.key(symbol, Some(notification.str_param("period")?)),
            FeedFamily::OrderBookTop => {
                let depth = notification.u64_param("depth")?;
                let speed = notification.str_param("speed")?;
                family.key(symbol, Some(&top_qualifier(depth, speed)))
            }
            _ => family.key(symbol, None),
        };
        Some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_normalizes_symbol() {
        let a = FeedFamily::Trades.key(" ethbtc ", None);
        let b = FeedFamily::Trades.key("ETHBTC", None);
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "trades:ETHBTC:");

        assert_eq!(FeedFamily::Reports.key("", None), FeedFamily::Reports.key("*", None));
        assert_eq!(FeedFamily::Reports.account_key().as_str(), "reports:*:");
    }

    #[test]
    fn test_key_distinguishes_family_and_qualifier() {
        let m1 = FeedFamily::Candles.key("ETHBTC", Some("M1"));
        let h1 = FeedFamily::Candles.key("ETHBTC", Some("H1"));
        assert_ne!(m1, h1);
        assert_ne!(FeedFamily::Trades.key("ETHBTC", None), FeedFamily::Ticker.key("ETHBTC", None));
    }

    #[test]
    fn test_route_order_book() {
        let router = FamilyRouter;
        let n = Notification::new("updateOrderbook", json!({"symbol": "ethbtc", "sequence": 2}));
        assert_eq!(router.route(&n), Some(FeedFamily::OrderBook.key("ETHBTC", None)));

        let n = Notification::new("snapshotOrderbook", json!({"symbol": "ETHBTC"}));
        assert_eq!(router.route(&n), Some(FeedFamily::OrderBook.key("ETHBTC", None)));
    }

    #[test]
    fn test_route_candles_uses_period() {
        let n = Notification::new("updateCandles", json!({"symbol": "ETHBTC", "period": "M30", "data": []}));
        assert_eq!(
            FamilyRouter.route(&n),
            Some(FeedFamily::Candles.key("ETHBTC", Some("M30")))
        );
    }

    #[test]
    fn test_route_top_uses_depth_and_speed() {
        let n = Notification::new(
            "orderbookTop",
            json!({"symbol": "BTCUSD", "depth": 5, "speed": "100ms"}),
        );
        let expected = FeedFamily::OrderBookTop.key(
            "BTCUSD",
            Some(&top_qualifier_for(5, BookSpeed::Ms100)),
        );
        assert_eq!(FamilyRouter.route(&n), Some(expected));
    }

    #[test]
    fn test_route_account_feeds_to_wildcard() {
        let n = Notification::new("activeOrders", json!([]));
        assert_eq!(FamilyRouter.route(&n), Some(FeedFamily::Reports.account_key()));

        let n = Notification::new("report", json!({"symbol": "ETHBTC"}));
        assert_eq!(FamilyRouter.route(&n), Some(FeedFamily::Reports.account_key()));

        let n = Notification::new("balance", json!([]));
        assert_eq!(FamilyRouter.route(&n), Some(FeedFamily::Balances.account_key()));
    }

    #[test]
    fn test_route_drops_unknown() {
        assert_eq!(FamilyRouter.route(&Notification::new("heartbeat", json!({}))), None);
        assert_eq!(FamilyRouter.route(&Notification::new("ticker", json!({}))), None);
    }
}
