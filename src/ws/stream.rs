//! Typed feed streams.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{trace, warn};

use crate::error::ClientError;
use crate::ws::feed::FeedKey;
use crate::ws::messages::Notification;

/// A message on a feed that starts with a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage<T> {
    /// Initial state.
    Snapshot(Vec<T>),
    /// Incremental items.
    Update(Vec<T>),
}

impl<T> FeedMessage<T> {
    /// The items, whichever kind of message this is.
    pub fn into_items(self) -> Vec<T> {
        match self {
            FeedMessage::Snapshot(items) | FeedMessage::Update(items) => items,
        }
    }

    /// Whether this is the initial snapshot.
    pub fn is_snapshot(&self) -> bool {
        matches!(self, FeedMessage::Snapshot(_))
    }
}

/// A stream of typed items from one feed.
///
/// The stream ends when the feed is unsubscribed or the session closes.
/// Dropping it stops the feed's processing task.
pub struct FeedStream<T> {
    key: FeedKey,
    inner: ReceiverStream<T>,
}

impl<T> std::fmt::Debug for FeedStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedStream").field("key", &self.key).finish()
    }
}

impl<T> FeedStream<T> {
    pub(crate) fn new(key: FeedKey, rx: mpsc::Receiver<T>) -> Self {
        Self {
            key,
            inner: ReceiverStream::new(rx),
        }
    }

    /// Key of the feed.
    pub fn key(&self) -> &FeedKey {
        &self.key
    }
}

impl<T> Stream for FeedStream<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Spawn the task turning raw notifications into typed items.
///
/// `shape` may yield nothing for a notification. Notifications it fails to
/// parse are logged and skipped.
pub(crate) fn spawn_feed<T, F>(
    key: FeedKey,
    mut raw: mpsc::Receiver<Notification>,
    buffer: usize,
    mut shape: F,
) -> FeedStream<T>
where
    T: Send + 'static,
    F: FnMut(Notification) -> Result<Option<T>, ClientError> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(buffer.max(1));
    let task_key = key.clone();

    tokio::spawn(async move {
        while let Some(notification) = raw.recv().await {
            let method = notification.method.clone();
            match shape(notification) {
                Ok(Some(item)) => {
                    if tx.send(item).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(key = %task_key, method = %method, error = %e, "Failed to parse notification"),
            }
        }
        trace!(key = %task_key, "Feed task stopped");
    });

    FeedStream::new(key, rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::feed::FeedFamily;
    use futures_util::StreamExt;
    use serde_json::json;

    #[tokio::test]
    async fn test_spawn_feed_shapes_and_skips() {
        let key = FeedFamily::Ticker.key("ETHBTC", None);
        let (raw_tx, raw_rx) = mpsc::channel(8);
        let mut stream = spawn_feed(key.clone(), raw_rx, 8, |n: Notification| {
            let value: u64 = n.parse()?;
            Ok((value % 2 == 0).then_some(value))
        });
        assert_eq!(stream.key(), &key);

        for params in [json!(1), json!(2), json!("bad"), json!(4)] {
            raw_tx.send(Notification::new("ticker", params)).await.unwrap();
        }
        drop(raw_tx);

        let items: Vec<u64> = stream.by_ref().collect().await;
        assert_eq!(items, vec![2, 4]);
    }

    #[tokio::test]
    async fn test_dropping_stream_stops_task() {
        let (raw_tx, raw_rx) = mpsc::channel(1);
        let stream = spawn_feed(FeedFamily::Ticker.key("X", None), raw_rx, 1, |_| Ok(Some(())));
        drop(stream);

        // The task exits on its first failed send, dropping the raw receiver.
        let _ = raw_tx.send(Notification::new("ticker", json!({}))).await;
        tokio::time::timeout(std::time::Duration::from_secs(1), raw_tx.closed())
            .await
            .unwrap();
    }

    #[test]
    fn test_feed_stream_wakes_on_item() {
        let (tx, rx) = mpsc::channel(2);
        let mut stream = FeedStream::new(FeedFamily::Ticker.key("ETHBTC", None), rx);

        {
            let mut next = tokio_test::task::spawn(stream.next());
            tokio_test::assert_pending!(next.poll());
            tx.try_send(7u8).unwrap();
            assert!(next.is_woken());
            tokio_test::assert_ready_eq!(next.poll(), Some(7));
        }

        drop(tx);
        let mut next = tokio_test::task::spawn(stream.next());
        tokio_test::assert_ready_eq!(next.poll(), None);
    }

    #[test]
    fn test_feed_message_items() {
        let message = FeedMessage::Snapshot(vec![1, 2]);
        assert!(message.is_snapshot());
        assert_eq!(message.into_items(), vec![1, 2]);
        assert!(!FeedMessage::Update(vec![3]).is_snapshot());
    }
}
