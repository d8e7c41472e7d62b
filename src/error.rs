//! Error types for the exchange client library.

use serde::Deserialize;
use thiserror::Error;

/// The main error type for all client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP request with middleware failed
    #[error("HTTP request failed: {0}")]
    HttpMiddleware(#[from] reqwest_middleware::Error),

    /// The transport could not be established or maintained.
    #[error("Connection error: {0}")]
    Connection(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// The exchange returned an error object
    #[error("API error: {0}")]
    Api(ApiError),

    /// Rate limit exceeded
    #[error("Rate limit exceeded, retry after {retry_after_ms:?}ms")]
    RateLimitExceeded {
        /// Suggested wait time in milliseconds before retrying
        retry_after_ms: Option<u64>,
    },

    /// Authentication error
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Invalid response from the API
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The connection closed while a caller was waiting on it.
    #[error("WebSocket connection closed: {reason}")]
    ConnectionClosed {
        /// Reason for the closure
        reason: String,
    },

    /// The caller's cancellation signal fired before a reply arrived.
    #[error("Request cancelled")]
    Cancelled,

    /// Request timeout
    #[error("Request timed out")]
    Timeout,

    /// An order book diff did not follow the current sequence number.
    #[error("Order book sequence gap: expected {expected}, received {received}")]
    SequenceGap {
        /// The sequence number that would have been contiguous.
        expected: u64,
        /// The sequence number carried by the diff.
        received: u64,
    },

    /// Missing required credentials
    #[error("Missing credentials: API key and secret required for private endpoints")]
    MissingCredentials,
}

impl ClientError {
    pub(crate) fn closed(reason: impl Into<String>) -> Self {
        Self::ConnectionClosed {
            reason: reason.into(),
        }
    }
}

/// An error object returned by the exchange.
///
/// Both the WebSocket `error` member of a reply and the REST error body use this
/// shape: `{"code": 2001, "message": "Symbol not found", "description": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiError {
    /// Numeric error code.
    pub code: i64,
    /// Short error message.
    pub message: String,
    /// Optional detailed description.
    #[serde(default)]
    pub description: Option<String>,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.description {
            Some(description) => write!(f, "{} {}: {}", self.code, self.message, description),
            None => write!(f, "{} {}", self.code, self.message),
        }
    }
}

impl ApiError {
    /// Create a new API error from code and message.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            description: None,
        }
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Check if this is a rate limit error.
    pub fn is_rate_limit(&self) -> bool {
        self.code == error_codes::RATE_LIMIT_EXCEEDED
    }

    /// Check if this is an authentication failure.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self.code,
            error_codes::AUTHORIZATION_REQUIRED
                | error_codes::AUTHORIZATION_FAILED
                | error_codes::INVALID_SIGNATURE
        )
    }

    /// Check if the referenced symbol does not exist.
    pub fn is_symbol_not_found(&self) -> bool {
        self.code == error_codes::SYMBOL_NOT_FOUND
    }

    /// Check if the referenced order does not exist.
    pub fn is_order_not_found(&self) -> bool {
        self.code == error_codes::ORDER_NOT_FOUND
    }

    /// Check if this is an insufficient funds error.
    pub fn is_insufficient_funds(&self) -> bool {
        self.code == error_codes::INSUFFICIENT_FUNDS
    }

    /// Check if the service is temporarily unavailable.
    pub fn is_service_unavailable(&self) -> bool {
        self.code == error_codes::SERVICE_UNAVAILABLE
    }
}

/// Known exchange error codes.
pub mod error_codes {
    /// Too many requests.
    pub const RATE_LIMIT_EXCEEDED: i64 = 429;
    /// Internal server error.
    pub const INTERNAL_ERROR: i64 = 500;
    /// Service unavailable.
    pub const SERVICE_UNAVAILABLE: i64 = 503;

    /// Authorization required.
    pub const AUTHORIZATION_REQUIRED: i64 = 1001;
    /// Authorization failed.
    pub const AUTHORIZATION_FAILED: i64 = 1002;
    /// Invalid signature.
    pub const INVALID_SIGNATURE: i64 = 1004;

    /// Symbol not found.
    pub const SYMBOL_NOT_FOUND: i64 = 2001;
    /// Currency not found.
    pub const CURRENCY_NOT_FOUND: i64 = 2002;

    /// Insufficient funds.
    pub const INSUFFICIENT_FUNDS: i64 = 20001;
    /// Order not found.
    pub const ORDER_NOT_FOUND: i64 = 20002;
    /// Duplicate client order id.
    pub const DUPLICATE_CLIENT_ORDER_ID: i64 = 20008;

    /// Validation error.
    pub const VALIDATION_ERROR: i64 = 10001;
}
