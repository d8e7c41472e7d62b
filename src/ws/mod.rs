//! JSON-RPC WebSocket API client.
//!
//! One [`Session`] owns one connection. Requests are matched to replies by
//! id; push notifications are routed by feed key to per-feed streams. The
//! market data, trading and wallet endpoints each get their own session and
//! façade.
//!
//! # Example
//!
//! ```rust,ignore
//! use exchange_stream_client::ws::MarketDataClient;
//! use exchange_stream_client::ws::messages::TradesParams;
//! use futures_util::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MarketDataClient::connect_default().await?;
//!     let mut trades = client.subscribe_trades(TradesParams::new("ETHBTC").limit(10)).await?;
//!
//!     while let Some(message) = trades.next().await {
//!         for trade in message.into_items() {
//!             println!("{} {} @ {}", trade.side, trade.quantity, trade.price);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

mod config;
pub mod connection;
pub mod feed;
mod market;
pub mod messages;
pub mod orderbook;
pub mod session;
pub mod slots;
mod stream;
pub mod subscriptions;
mod trading;
mod wallet;

pub use config::{WsConfig, WsConfigBuilder, endpoints};
pub use connection::DuplexConnection;
pub use feed::{FamilyRouter, FeedFamily, FeedKey, FeedRouter};
pub use market::MarketDataClient;
pub use orderbook::{BookSide, BookState, DiffOutcome, OrderBookReconstructor, merge_side};
pub use session::{Session, WeakSession};
pub use slots::CompletionSlots;
pub use stream::{FeedMessage, FeedStream};
pub use subscriptions::SubscriptionRegistry;
pub use trading::TradingClient;
pub use wallet::WalletClient;
