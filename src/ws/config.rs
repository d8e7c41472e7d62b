//! WebSocket connection configuration.

use std::time::Duration;

/// WebSocket endpoint URLs.
pub mod endpoints {
    /// Public market data endpoint.
    pub const WS_MARKET_DATA: &str = "wss://api.exchange.example/api/ws/public";
    /// Private trading endpoint.
    pub const WS_TRADING: &str = "wss://api.exchange.example/api/ws/trading";
    /// Private wallet endpoint.
    pub const WS_WALLET: &str = "wss://api.exchange.example/api/ws/wallet";
}

/// Configuration for WebSocket sessions.
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// Maximum time to establish the transport.
    pub connect_timeout: Duration,
    /// Maximum time to wait for the reply(ies) to a request.
    pub request_timeout: Duration,
    /// Interval between transport-level pings.
    pub ping_interval: Duration,
    /// Capacity of the outbound frame queue.
    pub outbound_capacity: usize,
    /// Capacity of the inbound frame queue.
    pub inbound_capacity: usize,
    /// Buffer size of each subscription channel.
    pub feed_buffer: usize,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(10),
            ping_interval: Duration::from_secs(30),
            outbound_capacity: 64,
            inbound_capacity: 1024,
            feed_buffer: 256,
        }
    }
}

impl WsConfig {
    /// Create a new configuration builder.
    pub fn builder() -> WsConfigBuilder {
        WsConfigBuilder::new()
    }
}

/// Builder for [`WsConfig`].
#[derive(Debug, Clone, Default)]
pub struct WsConfigBuilder {
    config: WsConfig,
}

impl WsConfigBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: WsConfig::default(),
        }
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set ping interval.
    pub fn ping_interval(mut self, interval: Duration) -> Self {
        self.config.ping_interval = interval;
        self
    }

    /// Set the outbound and inbound queue capacities.
    pub fn queue_capacity(mut self, outbound: usize, inbound: usize) -> Self {
        self.config.outbound_capacity = outbound.max(1);
        self.config.inbound_capacity = inbound.max(1);
        self
    }

    /// Set the per-subscription buffer size.
    pub fn feed_buffer(mut self, size: usize) -> Self {
        self.config.feed_buffer = size.max(1);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> WsConfig {
        self.config
    }
}
