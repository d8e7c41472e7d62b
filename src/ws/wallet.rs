//! Authenticated wallet feeds over WebSocket.

use crate::auth::{CredentialsProvider, IncreasingNonce};
use crate::error::ClientError;
use crate::types::{Balance, Transaction};
use crate::ws::config::{WsConfig, endpoints};
use crate::ws::feed::FeedFamily;
use crate::ws::messages::{EmptyParams, Notification, methods};
use crate::ws::session::Session;
use crate::ws::stream::{FeedStream, spawn_feed};

/// Client for the wallet endpoint.
#[derive(Debug, Clone)]
pub struct WalletClient {
    session: Session,
}

impl WalletClient {
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

    /// Connect to the default wallet endpoint and log in.
    pub async fn connect_default(credentials: &dyn CredentialsProvider) -> Result<Self, ClientError> {
        Self::connect(endpoints::WS_WALLET, WsConfig::default(), credentials).await
    }

    /// Wrap an already authenticated session.
    pub fn from_session(session: Session) -> Self {
        Self { session }
    }

    /// The underlying session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Wallet balances.
    pub async fn balances(&self) -> Result<Vec<Balance>, ClientError> {
        self.session
            .request(methods::GET_WALLET_BALANCES, EmptyParams {})
            .await
    }

    /// Subscribe to balance changes. Each item is the full set of balances.
    pub async fn subscribe_balances(&self) -> Result<FeedStream<Vec<Balance>>, ClientError> {
        let key = FeedFamily::Balances.account_key();
        let raw = self
            .session
            .subscribe_feed(key.clone(), methods::SUBSCRIBE_BALANCES, EmptyParams {})
            .await?;

        Ok(spawn_feed(key, raw, self.buffer(), |n: Notification| {
            Ok(Some(n.parse::<Vec<Balance>>()?))
        }))
    }

    /// Stop the balance feed.
    pub async fn unsubscribe_balances(&self) -> Result<(), ClientError> {
        self.session
            .unsubscribe_feed(
                &FeedFamily::Balances.account_key(),
                methods::UNSUBSCRIBE_BALANCES,
                EmptyParams {},
            )
            .await
    }

    /// Subscribe to deposit and withdrawal updates.
    pub async fn subscribe_transactions(&self) -> Result<FeedStream<Transaction>, ClientError> {
        let key = FeedFamily::Transactions.account_key();
        let raw = self
            .session
            .subscribe_feed(key.clone(), methods::SUBSCRIBE_TRANSACTIONS, EmptyParams {})
            .await?;

        Ok(spawn_feed(key, raw, self.buffer(), |n: Notification| {
            Ok(Some(n.parse::<Transaction>()?))
        }))
    }

    /// Stop the transactions feed.
    pub async fn unsubscribe_transactions(&self) -> Result<(), ClientError> {
        self.session
            .unsubscribe_feed(
                &FeedFamily::Transactions.account_key(),
                methods::UNSUBSCRIBE_TRANSACTIONS,
                EmptyParams {},
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
