//! Trading WebSocket messages (login and order operations).

use rust_decimal::Decimal;
use serde::Serialize;
use serde_with::skip_serializing_none;
use time::OffsetDateTime;

use crate::auth::LOGIN_ALGORITHM;
use crate::types::{OrderType, Side, TimeInForce};

/// `login` request parameters.
#[derive(Debug, Clone, Serialize)]
pub struct LoginParams {
    /// Signature algorithm.
    pub algo: &'static str,
    /// Public API key.
    #[serde(rename = "pKey")]
    pub public_key: String,
    /// Nonce the signature covers.
    pub nonce: String,
    /// Base64 signature of the nonce.
    pub signature: String,
}

impl LoginParams {
    /// Create login parameters from an already computed signature.
    pub fn new(
        public_key: impl Into<String>,
        nonce: impl Into<String>,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            algo: LOGIN_ALGORITHM,
            public_key: public_key.into(),
            nonce: nonce.into(),
            signature: signature.into(),
        }
    }
}

/// `newOrder` request parameters.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderParams {
    /// Client order id. The exchange generates one when absent.
    pub client_order_id: Option<String>,
    /// Trading pair symbol.
    pub symbol: String,
    /// Buy or sell.
    pub side: Side,
    /// Order type.
    #[serde(rename = "type")]
    pub order_type: OrderType,
    /// Time in force.
    pub time_in_force: Option<TimeInForce>,
    /// Order quantity.
    pub quantity: Decimal,
    /// Limit price.
    pub price: Option<Decimal>,
    /// Trigger price for stop orders.
    pub stop_price: Option<Decimal>,
    /// Expiry for `GTD` orders.
    #[serde(with = "time::serde::rfc3339::option")]
    pub expire_time: Option<OffsetDateTime>,
    /// Reject instead of taking liquidity.
    pub post_only: Option<bool>,
}

impl NewOrderParams {
    /// Create an order request.
    pub fn new(
        order_type: OrderType,
        side: Side,
        symbol: impl Into<String>,
        quantity: Decimal,
    ) -> Self {
        Self {
            client_order_id: None,
            symbol: symbol.into(),
            side,
            order_type,
            time_in_force: None,
            quantity,
            price: None,
            stop_price: None,
            expire_time: None,
            post_only: None,
        }
    }

    /// Create a limit order request.
    pub fn limit(side: Side, symbol: impl Into<String>, quantity: Decimal, price: Decimal) -> Self {
        Self::new(OrderType::Limit, side, symbol, quantity).price(price)
    }

    /// Create a market order request.
    pub fn market(side: Side, symbol: impl Into<String>, quantity: Decimal) -> Self {
        Self::new(OrderType::Market, side, symbol, quantity)
    }

    /// Set client order id.
    pub fn client_order_id(mut self, id: impl Into<String>) -> Self {
        self.client_order_id = Some(id.into());
        self
    }

    /// Set limit price.
    pub fn price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    /// Set stop price.
    pub fn stop_price(mut self, price: Decimal) -> Self {
        self.stop_price = Some(price);
        self
    }

    /// Set time in force.
    pub fn time_in_force(mut self, tif: TimeInForce) -> Self {
        self.time_in_force = Some(tif);
        self
    }

    /// Set expiry time, implying `GTD`.
    pub fn expire_time(mut self, at: OffsetDateTime) -> Self {
        self.expire_time = Some(at);
        self.time_in_force = Some(TimeInForce::GTD);
        self
    }

    /// Set as post-only.
    pub fn post_only(mut self, post_only: bool) -> Self {
        self.post_only = Some(post_only);
        self
    }
}

/// `newOrderBatch` request parameters.
#[derive(Debug, Clone, Serialize)]
pub struct NewOrderBatchParams {
    /// Orders to place, in order.
    pub orders: Vec<NewOrderParams>,
}

/// `cancelOrder` request parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderParams {
    /// Client order id of the order to cancel.
    pub client_order_id: String,
}

impl CancelOrderParams {
    /// Cancel by client order id.
    pub fn new(client_order_id: impl Into<String>) -> Self {
        Self {
            client_order_id: client_order_id.into(),
        }
    }
}

/// `cancelReplaceOrder` request parameters.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceOrderParams {
    /// Client order id of the order to replace.
    pub client_order_id: String,
    /// Client order id of the replacement.
    pub request_client_id: String,
    /// New quantity.
    pub quantity: Decimal,
    /// New limit price.
    pub price: Option<Decimal>,
}

impl ReplaceOrderParams {
    /// Replace `client_order_id` with a new order identified by `request_client_id`.
    pub fn new(
        client_order_id: impl Into<String>,
        request_client_id: impl Into<String>,
        quantity: Decimal,
    ) -> Self {
        Self {
            client_order_id: client_order_id.into(),
            request_client_id: request_client_id.into(),
            quantity,
            price: None,
        }
    }

    /// Set the new limit price.
    pub fn price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }
}
