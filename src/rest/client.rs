//! REST API client implementation.

use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use reqwest_tracing::TracingMiddleware;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;

use crate::auth::{CredentialsProvider, IncreasingNonce, NonceProvider, sign_request};
use crate::error::{ApiError, ClientError};
use crate::rest::endpoints::{self, BASE_URL};
use crate::types::{Balance, OrderBook, PriceLevel, Report, Symbol, Ticker};

/// The REST API client.
///
/// # Example
///
/// ```rust,no_run
/// use exchange_stream_client::rest::RestClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = RestClient::new();
///     let book = client.get_order_book("ETHBTC", Some(10)).await?;
///     println!("Best bid: {:?}", book.best_bid());
///     Ok(())
/// }
/// ```
///
/// For private endpoints, provide credentials:
///
/// ```rust,no_run
/// use exchange_stream_client::rest::RestClient;
/// use exchange_stream_client::auth::StaticCredentials;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let credentials = Arc::new(StaticCredentials::new("api_key", "api_secret"));
///     let client = RestClient::builder()
///         .credentials(credentials)
///         .build();
///
///     let balances = client.get_trading_balance().await?;
///     println!("Balances: {:?}", balances);
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct RestClient {
    http_client: ClientWithMiddleware,
    base_url: String,
    credentials: Option<Arc<dyn CredentialsProvider>>,
    nonce_provider: Arc<dyn NonceProvider>,
}

impl RestClient {
    /// Create a client for public endpoints.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a new client builder.
    pub fn builder() -> RestClientBuilder {
        RestClientBuilder::new()
    }

    /// Get all symbols.
    pub async fn get_symbols(&self) -> Result<Vec<Symbol>, ClientError> {
        self.public_get(endpoints::public::SYMBOL, None::<&()>).await
    }

    /// Get one symbol.
    pub async fn get_symbol(&self, symbol: &str) -> Result<Symbol, ClientError> {
        let path = format!("{}/{}", endpoints::public::SYMBOL, symbol);
        self.public_get(&path, None::<&()>).await
    }

    /// Get the ticker for a symbol.
    pub async fn get_ticker(&self, symbol: &str) -> Result<Ticker, ClientError> {
        let path = format!("{}/{}", endpoints::public::TICKER, symbol);
        self.public_get(&path, None::<&()>).await
    }

    /// Get the order book for a symbol, `limit` levels per side (all when `None`).
    pub async fn get_order_book(
        &self,
        symbol: &str,
        limit: Option<u32>,
    ) -> Result<OrderBook, ClientError> {
        let path = format!("{}/{}", endpoints::public::ORDER_BOOK, symbol);
        let book: RestOrderBook = self.public_get(&path, Some(&LimitQuery { limit })).await?;
        Ok(OrderBook {
            symbol: symbol.to_string(),
            sequence: 0,
            timestamp: book.timestamp,
            ask: book.ask,
            bid: book.bid,
        })
    }

    /// Get trading account balances.
    pub async fn get_trading_balance(&self) -> Result<Vec<Balance>, ClientError> {
        self.private_get(endpoints::private::TRADING_BALANCE, None::<&()>)
            .await
    }

    /// Get active orders, optionally for one symbol.
    pub async fn get_active_orders(&self, symbol: Option<&str>) -> Result<Vec<Report>, ClientError> {
        self.private_get(endpoints::private::ORDERS, Some(&SymbolQuery { symbol }))
            .await
    }

    fn path_and_query<Q>(endpoint: &str, params: Option<&Q>) -> Result<String, ClientError>
    where
        Q: Serialize + ?Sized,
    {
        let query_string = match params {
            Some(params) => serde_urlencoded::to_string(params)
                .map_err(|e| ClientError::InvalidResponse(e.to_string()))?,
            None => String::new(),
        };
        Ok(if query_string.is_empty() {
            endpoint.to_string()
        } else {
            format!("{}?{}", endpoint, query_string)
        })
    }

    /// Make a public GET request.
    pub(crate) async fn public_get<T, Q>(
        &self,
        endpoint: &str,
        params: Option<&Q>,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, Self::path_and_query(endpoint, params)?);
        let response = self.http_client.get(&url).send().await?;
        self.parse_response(response).await
    }

    /// Make a signed GET request.
    pub(crate) async fn private_get<T, Q>(
        &self,
        endpoint: &str,
        params: Option<&Q>,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(ClientError::MissingCredentials)?;
        let creds = credentials.get_credentials();

        let path_and_query = Self::path_and_query(endpoint, params)?;
        let nonce = self.nonce_provider.next_nonce();
        let signature = sign_request(creds, "GET", &path_and_query, nonce, "")?;

        let url = format!("{}{}", self.base_url, path_and_query);
        let response = self
            .http_client
            .get(&url)
            .header("X-API-Key", &creds.api_key)
            .header("X-API-Nonce", nonce.to_string())
            .header("X-API-Signature", signature)
            .send()
            .await?;

        self.parse_response(response).await
    }

    /// Parse a response, mapping error bodies to [`ClientError::Api`].
    async fn parse_response<T>(&self, response: reqwest::Response) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        let retry_after_ms = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(|secs| secs.saturating_mul(1000));
        let body = response.text().await?;

        if status.is_success() {
            return serde_json::from_str(&body).map_err(|e| {
                ClientError::InvalidResponse(format!(
                    "Failed to parse response: {}. Body: {}",
                    e, body
                ))
            });
        }

        debug!(%status, "REST request failed");
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ClientError::RateLimitExceeded { retry_after_ms });
        }

        match serde_json::from_str::<ErrorBody>(&body) {
            Ok(ErrorBody { error }) if error.is_rate_limit() => {
                Err(ClientError::RateLimitExceeded { retry_after_ms })
            }
            Ok(ErrorBody { error }) => Err(ClientError::Api(error)),
            Err(_) => Err(ClientError::InvalidResponse(format!("HTTP {}: {}", status, body))),
        }
    }
}

impl Default for RestClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url)
            .field("has_credentials", &self.credentials.is_some())
            .finish()
    }
}

/// Builder for [`RestClient`].
pub struct RestClientBuilder {
    base_url: String,
    credentials: Option<Arc<dyn CredentialsProvider>>,
    nonce_provider: Option<Arc<dyn NonceProvider>>,
    user_agent: Option<String>,
    max_retries: u32,
}

impl RestClientBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            credentials: None,
            nonce_provider: None,
            user_agent: None,
            max_retries: 3,
        }
    }

    /// Set the base URL (useful for testing with a mock server).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the credentials provider for authenticated requests.
    pub fn credentials(mut self, credentials: Arc<dyn CredentialsProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set a custom nonce provider.
    pub fn nonce_provider(mut self, provider: Arc<dyn NonceProvider>) -> Self {
        self.nonce_provider = Some(provider);
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the maximum number of retries for transient failures.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Build the client.
    pub fn build(self) -> RestClient {
        let mut headers = HeaderMap::new();
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("exchange-stream-client/{}", env!("CARGO_PKG_VERSION")));
        let header_value = HeaderValue::from_str(&user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static("exchange-stream-client"));
        headers.insert(USER_AGENT, header_value);

        let reqwest_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(self.max_retries);

        let client = ClientBuilder::new(reqwest_client)
            .with(TracingMiddleware::default())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        let nonce_provider = self
            .nonce_provider
            .unwrap_or_else(|| Arc::new(IncreasingNonce::new()));

        RestClient {
            http_client: client,
            base_url: self.base_url,
            credentials: self.credentials,
            nonce_provider,
        }
    }
}

impl Default for RestClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Error body of a failed request.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ApiError,
}

/// Order book as returned by REST; the symbol is implied by the path.
#[derive(Debug, Deserialize)]
struct RestOrderBook {
    #[serde(default)]
    ask: Vec<PriceLevel>,
    #[serde(default)]
    bid: Vec<PriceLevel>,
    #[serde(with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
}

#[derive(Debug, Serialize)]
struct LimitQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
}

#[derive(Debug, Serialize)]
struct SymbolQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    symbol: Option<&'a str>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_and_query() {
        assert_eq!(
            RestClient::path_and_query("/api/2/order", Some(&SymbolQuery { symbol: Some("ETHBTC") }))
                .unwrap(),
            "/api/2/order?symbol=ETHBTC"
        );
        assert_eq!(
            RestClient::path_and_query("/api/2/order", Some(&SymbolQuery { symbol: None })).unwrap(),
            "/api/2/order"
        );
        assert_eq!(
            RestClient::path_and_query("/api/2/public/symbol", None::<&()>).unwrap(),
            "/api/2/public/symbol"
        );
    }

    #[tokio::test]
    async fn test_private_call_requires_credentials() {
        let client = RestClient::builder().base_url("http://127.0.0.1:1").build();
        assert!(matches!(
            client.get_trading_balance().await,
            Err(ClientError::MissingCredentials)
        ));
    }
}
