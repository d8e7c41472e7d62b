//! REST API client.
//!
//! Public market data plus the signed trading balance and active orders
//! calls. Private requests carry `X-API-Key`, `X-API-Nonce` and
//! `X-API-Signature` headers.

mod client;
pub mod endpoints;

pub use client::{RestClient, RestClientBuilder};
