//! Fan-out of push notifications to per-feed channels.

use std::collections::HashMap;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{trace, warn};

use crate::ws::feed::FeedKey;

/// Maps feed keys to the channel their notifications are delivered on.
///
/// At most one channel exists per key. Subscribing again replaces the
/// previous channel, whose receiver then sees end-of-stream.
pub struct SubscriptionRegistry<T> {
    feeds: RwLock<HashMap<FeedKey, mpsc::Sender<T>>>,
}

impl<T> std::fmt::Debug for SubscriptionRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("feeds", &self.feeds.read().keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<T> Default for SubscriptionRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SubscriptionRegistry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            feeds: RwLock::new(HashMap::new()),
        }
    }

    /// Open a channel of `buffer` items for `key`, replacing any existing one.
    pub fn subscribe(&self, key: FeedKey, buffer: usize) -> mpsc::Receiver<T> {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        if self.feeds.write().insert(key.clone(), tx).is_some() {
            trace!(%key, "Replaced existing feed channel");
        }
        rx
    }

    /// Forward `item` to the channel for `key` without waiting.
    ///
    /// Returns `false` when nobody is subscribed to `key`, the receiver has
    /// gone away, or the channel is full. Items that find the channel full
    /// are dropped.
    pub fn deliver(&self, key: &FeedKey, item: T) -> bool {
        let feeds = self.feeds.read();
        let Some(tx) = feeds.get(key) else {
            trace!(%key, "No subscriber for notification");
            return false;
        };

        match tx.try_send(item) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(%key, "Feed channel full, dropping notification");
                false
            }
            Err(TrySendError::Closed(_)) => {
                trace!(%key, "Feed receiver dropped");
                false
            }
        }
    }

    /// Remove and close the channel for `key`.
    pub fn unsubscribe(&self, key: &FeedKey) -> bool {
        self.feeds.write().remove(key).is_some()
    }

    /// Remove and close every channel.
    pub fn close_all(&self) {
        self.feeds.write().clear();
    }

    /// Whether a channel exists for `key`.
    pub fn contains(&self, key: &FeedKey) -> bool {
        self.feeds.read().contains_key(key)
    }

    /// Number of open channels.
    pub fn len(&self) -> usize {
        self.feeds.read().len()
    }

    /// Whether no channel is open.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
