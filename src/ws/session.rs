//! A JSON-RPC session over one duplex connection.

use std::sync::{Arc, Weak};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::auth::{Credentials, NonceProvider, sign_login};
use crate::error::ClientError;
use crate::ws::config::WsConfig;
use crate::ws::connection::DuplexConnection;
use crate::ws::feed::{FamilyRouter, FeedKey, FeedRouter};
use crate::ws::messages::{InboundFrame, LoginParams, Notification, RpcReply, RpcRequest, methods};
use crate::ws::slots::CompletionSlots;
use crate::ws::subscriptions::SubscriptionRegistry;

struct SessionInner {
    connection: DuplexConnection,
    slots: Arc<CompletionSlots<RpcReply>>,
    feeds: Arc<SubscriptionRegistry<Notification>>,
    config: WsConfig,
}

/// A connected session.
///
/// Requests are correlated with their replies by id; notifications are routed
/// to per-feed channels. Cloning is cheap and clones share the connection.
/// The connection closes when the last clone is dropped.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("connection", &self.inner.connection)
            .field("pending_requests", &self.inner.slots.len())
            .field("feeds", &self.inner.feeds.len())
            .finish()
    }
}

/// Cancels the slot of a request whose caller stopped waiting.
struct SlotGuard<'a> {
    slots: &'a CompletionSlots<RpcReply>,
    id: u64,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        if self.slots.cancel(self.id) {
            trace!(id = self.id, "Abandoned request slot");
        }
    }
}

impl Session {
    /// Connect with the exchange's notification routing.
    pub async fn connect(url: &str, config: WsConfig) -> Result<Self, ClientError> {
        Self::connect_with_router(url, config, FamilyRouter).await
    }

    /// Connect with a custom notification router.
    pub async fn connect_with_router<R: FeedRouter>(
        url: &str,
        config: WsConfig,
        router: R,
    ) -> Result<Self, ClientError> {
        let (connection, inbound) = DuplexConnection::connect(url, &config).await?;
        let slots = Arc::new(CompletionSlots::new());
        let feeds = Arc::new(SubscriptionRegistry::new());

        tokio::spawn(dispatch(
            inbound,
            Arc::clone(&slots),
            Arc::clone(&feeds),
            router,
        ));

        Ok(Self {
            inner: Arc::new(SessionInner {
                connection,
                slots,
                feeds,
                config,
            }),
        })
    }

    /// Session configuration.
    pub fn config(&self) -> &WsConfig {
        &self.inner.config
    }

    /// Whether the underlying connection is open.
    pub fn is_connected(&self) -> bool {
        self.inner.connection.is_open()
    }

    /// Number of requests waiting for replies.
    pub fn pending_requests(&self) -> usize {
        self.inner.slots.len()
    }

    /// Send a request and wait for its reply.
    pub async fn request<P, R>(&self, method: &str, params: P) -> Result<R, ClientError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let reply = self.call(method, params, 1, None).await?;
        first_reply(reply)?.into_result()
    }

    /// Send a request and wait for its reply or for `cancel` to fire.
    pub async fn request_with_cancel<P, R>(
        &self,
        method: &str,
        params: P,
        cancel: &CancellationToken,
    ) -> Result<R, ClientError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let reply = self.call(method, params, 1, Some(cancel)).await?;
        first_reply(reply)?.into_result()
    }

    /// Send a request answered by `count` replies sharing its id.
    ///
    /// The outer result fails on transport errors and timeouts; each inner
    /// result carries one reply, in arrival order. An error as the first of
    /// several expected replies rejects the whole request: it is returned as
    /// the outer error and later replies for the id are dropped.
    pub async fn request_many<P, R>(
        &self,
        method: &str,
        params: P,
        count: usize,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<Result<R, ClientError>>, ClientError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let mut replies = self.call(method, params, count, cancel).await?;
        if replies.len() < count {
            return Err(match replies.pop().and_then(|reply| reply.error) {
                Some(error) => ClientError::Api(error),
                None => ClientError::InvalidResponse(format!(
                    "expected {count} replies to {method}"
                )),
            });
        }
        Ok(replies.into_iter().map(RpcReply::into_result).collect())
    }

    async fn call<P: Serialize>(
        &self,
        method: &str,
        params: P,
        uses: usize,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<RpcReply>, ClientError> {
        let uses = uses.max(1);
        let (id, mut rx) = self.inner.slots.register(uses);
        let _guard = SlotGuard {
            slots: &self.inner.slots,
            id,
        };
        let frame = RpcRequest::new(method, params, id).to_frame()?;

        let exchange = async {
            debug!(method, id, "Sending request");
            self.inner.connection.send(frame).await?;

            let mut replies = Vec::with_capacity(uses);
            while replies.len() < uses {
                match rx.recv().await {
                    Some(reply) => {
                        let rejected = uses > 1 && replies.is_empty() && reply.error.is_some();
                        replies.push(reply);
                        if rejected {
                            debug!(method, id, "Request rejected before any reply succeeded");
                            break;
                        }
                    }
                    None => return Err(ClientError::closed("connection closed before reply")),
                }
            }
            Ok(replies)
        };
        let timed = timeout(self.inner.config.request_timeout, exchange);

        let outcome = match cancel {
            Some(token) => tokio::select! {
                outcome = timed => outcome,
                _ = token.cancelled() => {
                    debug!(method, id, "Request cancelled");
                    return Err(ClientError::Cancelled);
                }
            },
            None => timed.await,
        };

        outcome.map_err(|_| {
            debug!(method, id, "Request timed out");
            ClientError::Timeout
        })?
    }

    /// Authenticate the session.
    pub async fn login(
        &self,
        credentials: &Credentials,
        nonce: &dyn NonceProvider,
    ) -> Result<(), ClientError> {
        let nonce = nonce.next_nonce().to_string();
        let signature = sign_login(credentials, &nonce)?;
        let params = LoginParams::new(credentials.api_key.clone(), nonce, signature);

        let accepted: bool = self.request(methods::LOGIN, params).await?;
        if !accepted {
            return Err(ClientError::Auth("login rejected".into()));
        }
        debug!("Session authenticated");
        Ok(())
    }

    /// Open the local channel for `key`, replacing any existing one.
    pub fn register_feed(&self, key: FeedKey) -> mpsc::Receiver<Notification> {
        self.inner.feeds.subscribe(key, self.inner.config.feed_buffer)
    }

    /// Close the local channel for `key`.
    pub fn remove_feed(&self, key: &FeedKey) -> bool {
        self.inner.feeds.unsubscribe(key)
    }

    /// Open the channel for `key`, then ask the exchange for the feed.
    ///
    /// The channel exists before the request is sent so no notification
    /// racing the reply is lost. It is removed again if the request fails.
    pub async fn subscribe_feed<P: Serialize>(
        &self,
        key: FeedKey,
        method: &str,
        params: P,
    ) -> Result<mpsc::Receiver<Notification>, ClientError> {
        let rx = self.register_feed(key.clone());
        match self.request::<_, Value>(method, params).await {
            Ok(_) => {
                debug!(%key, method, "Subscribed");
                Ok(rx)
            }
            Err(e) => {
                self.remove_feed(&key);
                Err(e)
            }
        }
    }

    /// Close the channel for `key` and tell the exchange to stop the feed.
    pub async fn unsubscribe_feed<P: Serialize>(
        &self,
        key: &FeedKey,
        method: &str,
        params: P,
    ) -> Result<(), ClientError> {
        self.remove_feed(key);
        self.request::<_, Value>(method, params).await?;
        debug!(%key, method, "Unsubscribed");
        Ok(())
    }

    /// A handle that does not keep the session alive.
    pub fn downgrade(&self) -> WeakSession {
        WeakSession {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Close the connection. Waiting requests fail and feeds end.
    pub fn close(&self) {
        self.inner.connection.close();
        self.inner.slots.close_all();
        self.inner.feeds.close_all();
    }
}

/// Weak handle to a [`Session`].
#[derive(Clone)]
pub struct WeakSession {
    inner: Weak<SessionInner>,
}

impl WeakSession {
    /// The session, if it is still alive.
    pub fn upgrade(&self) -> Option<Session> {
        self.inner.upgrade().map(|inner| Session { inner })
    }

    /// Re-send a subscribe request from a detached task.
    ///
    /// The feed's local channel is left in place. Used by feed tasks that
    /// must not wait on a reply themselves.
    pub fn resubscribe_detached(&self, method: &'static str, params: Value) {
        let weak = self.clone();
        tokio::spawn(async move {
            let Some(session) = weak.upgrade() else {
                return;
            };
            match session.request::<_, Value>(method, params).await {
                Ok(_) => debug!(method, "Resubscribed"),
                Err(e) => warn!(method, error = %e, "Resubscribe failed"),
            }
        });
    }
}

fn first_reply(replies: Vec<RpcReply>) -> Result<RpcReply, ClientError> {
    replies
        .into_iter()
        .next()
        .ok_or_else(|| ClientError::closed("connection closed before reply"))
}

async fn dispatch<R: FeedRouter>(
    mut inbound: mpsc::Receiver<String>,
    slots: Arc<CompletionSlots<RpcReply>>,
    feeds: Arc<SubscriptionRegistry<Notification>>,
    router: R,
) {
    while let Some(text) = inbound.recv().await {
        match InboundFrame::parse(&text) {
            Ok(InboundFrame::Reply(reply)) => {
                let id = reply.id;
                if !slots.deliver(id, reply) {
                    debug!(id, "Dropping reply with no waiting request");
                }
            }
            Ok(InboundFrame::Notification(notification)) => match router.route(&notification) {
                Some(key) => {
                    feeds.deliver(&key, notification);
                }
                None => trace!(method = %notification.method, "Dropping unroutable notification"),
            },
            Ok(InboundFrame::Unknown(value)) => debug!(frame = %value, "Dropping unrecognized frame"),
            Err(e) => warn!(error = %e, "Failed to parse inbound frame"),
        }
    }

    slots.close_all();
    feeds.close_all();
    debug!("Session dispatch stopped");
}
