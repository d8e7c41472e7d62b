//! JSON-RPC envelope types.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, ClientError};

/// Protocol version carried by every request.
pub const JSONRPC_VERSION: &str = "2.0";

/// Outbound request frame.
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest<'a, P> {
    /// Protocol version.
    pub jsonrpc: &'static str,
    /// The method to call.
    pub method: &'a str,
    /// Request parameters.
    pub params: P,
    /// Request id used to correlate the reply.
    pub id: u64,
}

impl<'a, P: Serialize> RpcRequest<'a, P> {
    /// Create a new request.
    pub fn new(method: &'a str, params: P, id: u64) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method,
            params,
            id,
        }
    }

    /// Serialize the request into a text frame.
    pub fn to_frame(&self) -> Result<String, ClientError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Empty parameter object, serialized as `{}`.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct EmptyParams {}

/// A reply correlated to a request by id.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcReply {
    /// Request id from the original request.
    pub id: u64,
    /// Result data (if successful).
    #[serde(default)]
    pub result: Option<Value>,
    /// Error information (if failed).
    #[serde(default)]
    pub error: Option<ApiError>,
}

impl RpcReply {
    /// Convert into the typed result, or the exchange error.
    pub fn into_result<T: DeserializeOwned>(self) -> Result<T, ClientError> {
        if let Some(error) = self.error {
            return Err(ClientError::Api(error));
        }
        let result = self.result.ok_or_else(|| {
            ClientError::InvalidResponse(format!("Reply {} has neither result nor error", self.id))
        })?;
        Ok(serde_json::from_value(result)?)
    }
}

/// A server push not correlated to any request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Notification method (e.g. "updateOrderbook").
    pub method: String,
    /// Notification payload.
    #[serde(default)]
    pub params: Value,
}

impl Notification {
    /// Create a notification.
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    /// Parse the payload.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        Ok(T::deserialize(&self.params)?)
    }

    /// A string member of an object payload.
    pub fn str_param(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(Value::as_str)
    }

    /// An integer member of an object payload.
    pub fn u64_param(&self, name: &str) -> Option<u64> {
        self.params.get(name).and_then(Value::as_u64)
    }
}

/// Routing view of an inbound frame.
#[derive(Debug, Clone)]
pub enum InboundFrame {
    /// A reply to request `id`.
    Reply(RpcReply),
    /// A push notification.
    Notification(Notification),
    /// Valid JSON that is neither.
    Unknown(Value),
}

#[derive(Deserialize)]
struct RawFrame {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    params: Option<Value>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ApiError>,
}

impl InboundFrame {
    /// Parse a text frame. A nonzero `id` marks a reply, otherwise a `method`
    /// marks a notification.
    pub fn parse(text: &str) -> Result<Self, ClientError> {
        let value: Value = serde_json::from_str(text)?;
        let raw = RawFrame::deserialize(&value)?;

        match (raw.id, raw.method) {
            (Some(id), _) if id != 0 => Ok(Self::Reply(RpcReply {
                id,
                result: raw.result,
                error: raw.error,
            })),
            (_, Some(method)) => Ok(Self::Notification(Notification {
                method,
                params: raw.params.unwrap_or(Value::Null),
            })),
            _ => Ok(Self::Unknown(value)),
        }
    }
}

/// Method names.
pub mod methods {
    // Requests
    pub const LOGIN: &str = "login";
    pub const GET_SYMBOL: &str = "getSymbol";
    pub const GET_SYMBOLS: &str = "getSymbols";
    pub const NEW_ORDER: &str = "newOrder";
    pub const NEW_ORDER_BATCH: &str = "newOrderBatch";
    pub const CANCEL_ORDER: &str = "cancelOrder";
    pub const CANCEL_REPLACE_ORDER: &str = "cancelReplaceOrder";
    pub const GET_ORDERS: &str = "getOrders";
    pub const GET_TRADING_BALANCE: &str = "getTradingBalance";
    pub const GET_WALLET_BALANCES: &str = "getWalletBalances";

    // Subscriptions
    pub const SUBSCRIBE_TRADES: &str = "subscribeTrades";
    pub const UNSUBSCRIBE_TRADES: &str = "unsubscribeTrades";
    pub const SUBSCRIBE_CANDLES: &str = "subscribeCandles";
    pub const UNSUBSCRIBE_CANDLES: &str = "unsubscribeCandles";
    pub const SUBSCRIBE_TICKER: &str = "subscribeTicker";
    pub const UNSUBSCRIBE_TICKER: &str = "unsubscribeTicker";
    pub const SUBSCRIBE_ORDERBOOK: &str = "subscribeOrderbook";
    pub const UNSUBSCRIBE_ORDERBOOK: &str = "unsubscribeOrderbook";
    pub const SUBSCRIBE_ORDERBOOK_TOP: &str = "subscribeOrderbookTop";
    pub const UNSUBSCRIBE_ORDERBOOK_TOP: &str = "unsubscribeOrderbookTop";
    pub const SUBSCRIBE_REPORTS: &str = "subscribeReports";
    pub const SUBSCRIBE_BALANCES: &str = "subscribeBalances";
    pub const UNSUBSCRIBE_BALANCES: &str = "unsubscribeBalances";
    pub const SUBSCRIBE_TRANSACTIONS: &str = "subscribeTransactions";
    pub const UNSUBSCRIBE_TRANSACTIONS: &str = "unsubscribeTransactions";

    // Notifications
    pub const SNAPSHOT_TRADES: &str = "snapshotTrades";
    pub const UPDATE_TRADES: &str = "updateTrades";
    pub const SNAPSHOT_CANDLES: &str = "snapshotCandles";
    pub const UPDATE_CANDLES: &str = "updateCandles";
    pub const TICKER: &str = "ticker";
    pub const SNAPSHOT_ORDERBOOK: &str = "snapshotOrderbook";
    pub const UPDATE_ORDERBOOK: &str = "updateOrderbook";
    pub const ORDERBOOK_TOP: &str = "orderbookTop";
    pub const ACTIVE_ORDERS: &str = "activeOrders";
    pub const REPORT: &str = "report";
    pub const BALANCE: &str = "balance";
    pub const UPDATE_TRANSACTION: &str = "updateTransaction";
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_frame() {
        let frame = RpcRequest::new("getSymbol", json!({"symbol": "ETHBTC"}), 7)
            .to_frame()
            .unwrap();
        let value: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["method"], "getSymbol");
        assert_eq!(value["params"]["symbol"], "ETHBTC");
        assert_eq!(value["id"].as_u64(), Some(7));
    }

    #[test]
    fn test_empty_params_serialize_as_object() {
        let frame = RpcRequest::new("getOrders", EmptyParams {}, 1).to_frame().unwrap();
        assert!(frame.contains(r#""params":{}"#));
    }

    #[test]
    fn test_parse_reply() {
        let frame = InboundFrame::parse(r#"{"jsonrpc":"2.0","result":true,"id":12}"#).unwrap();
        match frame {
            InboundFrame::Reply(reply) => {
                assert_eq!(reply.id, 12);
                assert!(reply.into_result::<bool>().unwrap());
            }
            other => panic!("expected reply, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_error_reply() {
        let text = r#"{"jsonrpc":"2.0","error":{"code":2001,"message":"Symbol not found"},"id":3}"#;
        let InboundFrame::Reply(reply) = InboundFrame::parse(text).unwrap() else {
            panic!("expected reply");
        };
        match reply.into_result::<bool>() {
            Err(ClientError::Api(error)) => assert!(error.is_symbol_not_found()),
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_notification() {
        let text = r#"{"jsonrpc":"2.0","method":"updateOrderbook","params":{"symbol":"ETHBTC","sequence":9}}"#;
        let InboundFrame::Notification(n) = InboundFrame::parse(text).unwrap() else {
            panic!("expected notification");
        };
        assert_eq!(n.method, "updateOrderbook");
        assert_eq!(n.str_param("symbol"), Some("ETHBTC"));
        assert_eq!(n.u64_param("sequence"), Some(9));
    }

    #[test]
    fn test_zero_id_is_not_a_reply() {
        let text = r#"{"jsonrpc":"2.0","method":"ticker","params":{},"id":0}"#;
        assert!(matches!(
            InboundFrame::parse(text).unwrap(),
            InboundFrame::Notification(_)
        ));

        let text = r#"{"jsonrpc":"2.0","id":null}"#;
        assert!(matches!(
            InboundFrame::parse(text).unwrap(),
            InboundFrame::Unknown(_)
        ));
    }

    #[test]
    fn test_reply_without_result_is_invalid() {
        let reply = RpcReply {
            id: 5,
            result: None,
            error: None,
        };
        assert!(matches!(
            reply.into_result::<bool>(),
            Err(ClientError::InvalidResponse(_))
        ));
    }
}
