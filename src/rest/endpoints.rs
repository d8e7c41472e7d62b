//! REST API endpoint constants.

/// Base URL for the REST API.
pub const BASE_URL: &str = "https://api.exchange.example";

/// Public endpoints (no authentication required).
pub mod public {
    /// All symbols; append `/{symbol}` for one.
    pub const SYMBOL: &str = "/api/2/public/symbol";
    /// Ticker; append `/{symbol}`.
    pub const TICKER: &str = "/api/2/public/ticker";
    /// Order book; append `/{symbol}`.
    pub const ORDER_BOOK: &str = "/api/2/public/orderbook";
}

/// Private endpoints (authentication required).
pub mod private {
    /// Trading account balance.
    pub const TRADING_BALANCE: &str = "/api/2/trading/balance";
    /// Active orders.
    pub const ORDERS: &str = "/api/2/order";
}
