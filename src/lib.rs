//! # Exchange Stream Client
//!
//! An async Rust client library for a JSON-RPC trading exchange, over REST and
//! WebSocket.
//!
//! ## Features
//!
//! - One duplex WebSocket connection per endpoint, with request/reply
//!   correlation and many push feeds multiplexed over it
//! - Order books rebuilt from snapshot plus diffs, resynchronized on sequence gaps
//! - HMAC authenticated trading and wallet sessions
//! - A small REST client with tracing and retries
//! - Financial precision with `rust_decimal`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use exchange_stream_client::ws::MarketDataClient;
//! use futures_util::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MarketDataClient::connect_default().await?;
//!     let mut ticker = client.subscribe_ticker("ETHBTC").await?;
//!     if let Some(ticker) = ticker.next().await {
//!         println!("Last: {:?}", ticker.last);
//!     }
//!     client.close();
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod error;
pub mod rest;
pub mod types;
pub mod ws;

// Re-export commonly used types at crate root
pub use error::{ApiError, ClientError};
pub use types::common::{OrderStatus, OrderType, Side};

/// Result type alias using ClientError
pub type Result<T> = std::result::Result<T, ClientError>;
