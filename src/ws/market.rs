//! Public market data over WebSocket.

use serde_json::json;
use tracing::warn;

use crate::error::ClientError;
use crate::types::{BookSpeed, Candle, OrderBook, Period, Symbol, Ticker, Trade};
use crate::ws::config::{WsConfig, endpoints};
use crate::ws::feed::{FeedFamily, top_qualifier_for};
use crate::ws::messages::{
    CandlesParams, CandlesPayload, EmptyParams, Notification, OrderBookTopParams, SymbolParams,
    TradesParams, TradesPayload, methods,
};
use crate::ws::orderbook::{DiffOutcome, OrderBookReconstructor};
use crate::ws::session::Session;
use crate::ws::stream::{FeedMessage, FeedStream, spawn_feed};

/// Client for the public market data endpoint.
///
/// # Example
///
/// ```rust,ignore
/// use exchange_stream_client::ws::MarketDataClient;
/// use futures_util::StreamExt;
///
/// let client = MarketDataClient::connect_default().await?;
/// let mut book = client.subscribe_order_book("ETHBTC").await?;
///
/// while let Some(book) = book.next().await {
///     println!("{} spread {:?}", book.symbol, book.spread());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MarketDataClient {
    session: Session,
}

impl MarketDataClient {
    /// Connect to `url`.
    pub async fn connect(url: &str, config: WsConfig) -> Result<Self, ClientError> {
        Ok(Self::from_session(Session::connect(url, config).await?))
    }

    /// Connect to the default public endpoint.
    pub async fn connect_default() -> Result<Self, ClientError> {
        Self::connect(endpoints::WS_MARKET_DATA, WsConfig::default()).await
    }

    /// Wrap an existing session.
    pub fn from_session(session: Session) -> Self {
        Self { session }
    }

    /// The underlying session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Get one symbol.
    pub async fn get_symbol(&self, symbol: &str) -> Result<Symbol, ClientError> {
        self.session
            .request(methods::GET_SYMBOL, SymbolParams::new(symbol))
            .await
    }

    /// Get all symbols.
    pub async fn get_symbols(&self) -> Result<Vec<Symbol>, ClientError> {
        self.session.request(methods::GET_SYMBOLS, EmptyParams {}).await
    }

    /// Subscribe to public trades.
    pub async fn subscribe_trades(
        &self,
        params: TradesParams,
    ) -> Result<FeedStream<FeedMessage<Trade>>, ClientError> {
        let key = FeedFamily::Trades.key(&params.symbol, None);
        let raw = self
            .session
            .subscribe_feed(key.clone(), methods::SUBSCRIBE_TRADES, &params)
            .await?;

        Ok(spawn_feed(key, raw, self.buffer(), |n: Notification| {
            let payload: TradesPayload = n.parse()?;
            Ok(Some(if n.method == methods::SNAPSHOT_TRADES {
                FeedMessage::Snapshot(payload.data)
            } else {
                FeedMessage::Update(payload.data)
            }))
        }))
    }

    /// Stop the trades feed for `symbol`.
    pub async fn unsubscribe_trades(&self, symbol: &str) -> Result<(), ClientError> {
        let key = FeedFamily::Trades.key(symbol, None);
        self.session
            .unsubscribe_feed(&key, methods::UNSUBSCRIBE_TRADES, SymbolParams::new(symbol))
            .await
    }

    /// Subscribe to candles.
    pub async fn subscribe_candles(
        &self,
        params: CandlesParams,
    ) -> Result<FeedStream<FeedMessage<Candle>>, ClientError> {
        let key = FeedFamily::Candles.key(&params.symbol, Some(params.period.as_str()));
        let raw = self
            .session
            .subscribe_feed(key.clone(), methods::SUBSCRIBE_CANDLES, &params)
            .await?;

        Ok(spawn_feed(key, raw, self.buffer(), |n: Notification| {
            let payload: CandlesPayload = n.parse()?;
            Ok(Some(if n.method == methods::SNAPSHOT_CANDLES {
                FeedMessage::Snapshot(payload.data)
            } else {
                FeedMessage::Update(payload.data)
            }))
        }))
    }

    /// Stop the candles feed for `symbol` and `period`.
    pub async fn unsubscribe_candles(&self, symbol: &str, period: Period) -> Result<(), ClientError> {
        let key = FeedFamily::Candles.key(symbol, Some(period.as_str()));
        self.session
            .unsubscribe_feed(&key, methods::UNSUBSCRIBE_CANDLES, CandlesParams::new(symbol, period))
            .await
    }

    /// Subscribe to the ticker.
    pub async fn subscribe_ticker(&self, symbol: &str) -> Result<FeedStream<Ticker>, ClientError> {
        let key = FeedFamily::Ticker.key(symbol, None);
        let raw = self
            .session
            .subscribe_feed(key.clone(), methods::SUBSCRIBE_TICKER, SymbolParams::new(symbol))
            .await?;

        Ok(spawn_feed(key, raw, self.buffer(), |n: Notification| {
            Ok(Some(n.parse::<Ticker>()?))
        }))
    }

    /// Stop the ticker feed for `symbol`.
    pub async fn unsubscribe_ticker(&self, symbol: &str) -> Result<(), ClientError> {
        let key = FeedFamily::Ticker.key(symbol, None);
        self.session
            .unsubscribe_feed(&key, methods::UNSUBSCRIBE_TICKER, SymbolParams::new(symbol))
            .await
    }

    /// Subscribe to the full order book.
    ///
    /// Each item is the whole book after applying a snapshot or an in-order
    /// diff. On a sequence gap the feed is requested again and resumes from
    /// the next snapshot; no broken book is ever yielded.
    pub async fn subscribe_order_book(
        &self,
        symbol: &str,
    ) -> Result<FeedStream<OrderBook>, ClientError> {
        let key = FeedFamily::OrderBook.key(symbol, None);
        let raw = self
            .session
            .subscribe_feed(key.clone(), methods::SUBSCRIBE_ORDERBOOK, SymbolParams::new(symbol))
            .await?;

        let session = self.session.downgrade();
        let feed_symbol = symbol.to_string();
        let mut book = OrderBookReconstructor::new();

        Ok(spawn_feed(key, raw, self.buffer(), move |n: Notification| {
            let update: OrderBook = n.parse()?;
            if n.method == methods::SNAPSHOT_ORDERBOOK {
                return Ok(Some(book.apply_snapshot(update).clone()));
            }

            let error = match book.apply_diff(update) {
                Ok(DiffOutcome::Applied(current)) => return Ok(Some(current.clone())),
                Ok(DiffOutcome::Ignored) => return Ok(None),
                Err(e) => e,
            };

            match error {
                ClientError::SequenceGap { expected, received } => {
                    warn!(symbol = %feed_symbol, expected, received, "Order book sequence gap, resubscribing");
                    session.resubscribe_detached(
                        methods::SUBSCRIBE_ORDERBOOK,
                        json!({ "symbol": feed_symbol }),
                    );
                    book.mark_resubscribed();
                    Ok(None)
                }
                e => Err(e),
            }
        }))
    }

    /// Stop the order book feed for `symbol`.
    pub async fn unsubscribe_order_book(&self, symbol: &str) -> Result<(), ClientError> {
        let key = FeedFamily::OrderBook.key(symbol, None);
        self.session
            .unsubscribe_feed(&key, methods::UNSUBSCRIBE_ORDERBOOK, SymbolParams::new(symbol))
            .await
    }

    /// Subscribe to periodic top-of-book snapshots.
    pub async fn subscribe_order_book_top(
        &self,
        params: OrderBookTopParams,
    ) -> Result<FeedStream<OrderBook>, ClientError> {
        let key = FeedFamily::OrderBookTop.key(
            &params.symbol,
            Some(&top_qualifier_for(params.depth, params.speed)),
        );
        let raw = self
            .session
            .subscribe_feed(key.clone(), methods::SUBSCRIBE_ORDERBOOK_TOP, &params)
            .await?;

        Ok(spawn_feed(key, raw, self.buffer(), |n: Notification| {
            Ok(Some(n.parse::<OrderBook>()?))
        }))
    }

    /// Stop a top-of-book feed.
    pub async fn unsubscribe_order_book_top(
        &self,
        symbol: &str,
        depth: u32,
        speed: BookSpeed,
    ) -> Result<(), ClientError> {
        let key = FeedFamily::OrderBookTop.key(symbol, Some(&top_qualifier_for(depth, speed)));
        self.session
            .unsubscribe_feed(
                &key,
                methods::UNSUBSCRIBE_ORDERBOOK_TOP,
                OrderBookTopParams::new(symbol, depth, speed),
            )
            .await
    }

    /// Close the connection.
    pub fn close(&self) {
        self.session.close();
    }

    fn buffer(&self) -> usize {
        self.session.config().feed_buffer
    }
}
