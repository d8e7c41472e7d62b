//! Authenticated trading over WebSocket.

use tokio_util::sync::CancellationToken;

use crate::auth::{CredentialsProvider, IncreasingNonce};
use crate::error::ClientError;
use crate::types::{Balance, Report};
use crate::ws::config::{WsConfig, endpoints};
use crate::ws::feed::FeedFamily;
use crate::ws::messages::{
    CancelOrderParams, EmptyParams, NewOrderBatchParams, NewOrderParams, Notification,
    ReplaceOrderParams, methods,
};
use crate::ws::session::Session;
use crate::ws::stream::{FeedMessage, FeedStream, spawn_feed};

/// Client for the trading endpoint.
///
/// # Example
///
/// ```rust,ignore
/// use exchange_stream_client::auth::StaticCredentials;
/// use exchange_stream_client::types::Side;
/// use exchange_stream_client::ws::TradingClient;
/// use exchange_stream_client::ws::messages::NewOrderParams;
/// use rust_decimal_macros::dec;
///
/// let credentials = StaticCredentials::new("api_key", "api_secret");
/// let client = TradingClient::connect_default(&credentials).await?;
///
/// let order = NewOrderParams::limit(Side::Buy, "ETHBTC", dec!(0.01), dec!(0.05));
/// let report = client.place_order(order).await?;
/// println!("{} {:?}", report.client_order_id, report.status);
/// ```
#[derive(Debug, Clone)]
pub struct TradingClient {
    session: Session,
}

impl TradingClient {
    /// Connect to `url` and log in.
    pub async fn connect(
        url: &str,
        config: WsConfig,
        credentials: &dyn CredentialsProvider,
    ) -> Result<Self, ClientError> {
        let session = Session::connect(url, config).await?;
        session
            .login(credentials.get_credentials(), &IncreasingNonce::new())
            .await?;
        Ok(Self::from_session(session))
    }

    /// Connect to the default trading endpoint and log in.
    pub async fn connect_default(credentials: &dyn CredentialsProvider) -> Result<Self, ClientError> {
        Self::connect(endpoints::WS_TRADING, WsConfig::default(), credentials).await
    }

    /// Wrap an already authenticated session.
    pub fn from_session(session: Session) -> Self {
        Self { session }
    }

    /// The underlying session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Place an order.
    pub async fn place_order(&self, order: NewOrderParams) -> Result<Report, ClientError> {
        self.session.request(methods::NEW_ORDER, order).await
    }

    /// Place an order, giving up when `cancel` fires.
    pub async fn place_order_with_cancel(
        &self,
        order: NewOrderParams,
        cancel: &CancellationToken,
    ) -> Result<Report, ClientError> {
        self.session
            .request_with_cancel(methods::NEW_ORDER, order, cancel)
            .await
    }

    /// Place several orders in one request.
    ///
    /// The exchange answers each order separately; results are in arrival
    /// order, one per order.
    pub async fn place_orders(
        &self,
        orders: Vec<NewOrderParams>,
    ) -> Result<Vec<Result<Report, ClientError>>, ClientError> {
        self.place_orders_inner(orders, None).await
    }

    /// Place several orders, giving up when `cancel` fires.
    pub async fn place_orders_with_cancel(
        &self,
        orders: Vec<NewOrderParams>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Result<Report, ClientError>>, ClientError> {
        self.place_orders_inner(orders, Some(cancel)).await
    }

    async fn place_orders_inner(
        &self,
        orders: Vec<NewOrderParams>,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<Result<Report, ClientError>>, ClientError> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }
        let count = orders.len();
        self.session
            .request_many(methods::NEW_ORDER_BATCH, NewOrderBatchParams { orders }, count, cancel)
            .await
    }

    /// Cancel an order by client order id.
    pub async fn cancel_order(&self, client_order_id: &str) -> Result<Report, ClientError> {
        self.session
            .request(methods::CANCEL_ORDER, CancelOrderParams::new(client_order_id))
            .await
    }

    /// Cancel an order, giving up when `cancel` fires.
    pub async fn cancel_order_with_cancel(
        &self,
        client_order_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Report, ClientError> {
        self.session
            .request_with_cancel(
                methods::CANCEL_ORDER,
                CancelOrderParams::new(client_order_id),
                cancel,
            )
            .await
    }

    /// Atomically replace an order.
    pub async fn replace_order(&self, params: ReplaceOrderParams) -> Result<Report, ClientError> {
        self.session
            .request(methods::CANCEL_REPLACE_ORDER, params)
            .await
    }

    /// Replace an order, giving up when `cancel` fires.
    pub async fn replace_order_with_cancel(
        &self,
        params: ReplaceOrderParams,
        cancel: &CancellationToken,
    ) -> Result<Report, ClientError> {
        self.session
            .request_with_cancel(methods::CANCEL_REPLACE_ORDER, params, cancel)
            .await
    }

    /// Open orders.
    pub async fn active_orders(&self) -> Result<Vec<Report>, ClientError> {
        self.session.request(methods::GET_ORDERS, EmptyParams {}).await
    }

    /// Trading account balances.
    pub async fn trading_balance(&self) -> Result<Vec<Balance>, ClientError> {
        self.session
            .request(methods::GET_TRADING_BALANCE, EmptyParams {})
            .await
    }

    /// Subscribe to execution reports.
    ///
    /// The first message is a snapshot of the open orders; each later
    /// message carries one report.
    pub async fn subscribe_reports(&self) -> Result<FeedStream<FeedMessage<Report>>, ClientError> {
        let key = FeedFamily::Reports.account_key();
        let raw = self
            .session
            .subscribe_feed(key.clone(), methods::SUBSCRIBE_REPORTS, EmptyParams {})
            .await?;

        let buffer = self.session.config().feed_buffer;
        Ok(spawn_feed(key, raw, buffer, |n: Notification| {
            if n.method == methods::ACTIVE_ORDERS {
                Ok(Some(FeedMessage::Snapshot(n.parse::<Vec<Report>>()?)))
            } else {
                Ok(Some(FeedMessage::Update(vec![n.parse::<Report>()?])))
            }
        }))
    }

    /// Close the connection.
    pub fn close(&self) {
        self.session.close();
    }
}
