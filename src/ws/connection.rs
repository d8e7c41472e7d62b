//! A single duplex WebSocket connection with independent send and receive loops.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval_at, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::ClientError;
use crate::ws::config::WsConfig;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// One persistent WebSocket connection.
///
/// Outbound text frames go through a bounded queue drained by a send task.
/// Inbound text frames are pushed by a receive task onto the queue returned
/// from [`DuplexConnection::connect`]; that queue closing is the signal that
/// the connection is gone.
pub struct DuplexConnection {
    url: String,
    outbound: Mutex<Option<mpsc::Sender<String>>>,
    open: Arc<AtomicBool>,
}

impl std::fmt::Debug for DuplexConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuplexConnection")
            .field("url", &self.url)
            .field("open", &self.is_open())
            .finish()
    }
}

impl DuplexConnection {
    /// Connect to `url` and start the send and receive loops.
    pub async fn connect(
        url: &str,
        config: &WsConfig,
    ) -> Result<(Self, mpsc::Receiver<String>), ClientError> {
        let parsed = Url::parse(url)?;
        if !matches!(parsed.scheme(), "ws" | "wss") {
            return Err(ClientError::Connection(format!(
                "Unsupported WebSocket scheme: {}",
                parsed.scheme()
            )));
        }

        let (ws_stream, _) = timeout(config.connect_timeout, connect_async(url))
            .await
            .map_err(|_| ClientError::Connection(format!("Timed out connecting to {}", url)))?
            .map_err(|e| ClientError::Connection(format!("Failed to connect to {}: {}", url, e)))?;

        let (sink, source) = ws_stream.split();
        let (outbound_tx, outbound_rx) = mpsc::channel(config.outbound_capacity.max(1));
        let (inbound_tx, inbound_rx) = mpsc::channel(config.inbound_capacity.max(1));
        let open = Arc::new(AtomicBool::new(true));
        let reader_done = CancellationToken::new();

        tokio::spawn(send_loop(
            sink,
            outbound_rx,
            config.ping_interval,
            reader_done.clone(),
            Arc::clone(&open),
        ));
        tokio::spawn(receive_loop(source, inbound_tx, reader_done, Arc::clone(&open)));

        debug!(url, "WebSocket connected");

        Ok((
            Self {
                url: url.to_string(),
                outbound: Mutex::new(Some(outbound_tx)),
                open,
            },
            inbound_rx,
        ))
    }

    /// Queue a text frame, waiting for room when the queue is full.
    pub async fn send(&self, frame: String) -> Result<(), ClientError> {
        let sender = self
            .outbound
            .lock()
            .clone()
            .ok_or_else(|| ClientError::closed("connection closed"))?;

        sender
            .send(frame)
            .await
            .map_err(|_| ClientError::closed("send queue closed"))
    }

    /// Begin the close handshake. Calling it again has no effect.
    pub fn close(&self) {
        if self.outbound.lock().take().is_some() {
            debug!(url = %self.url, "Closing WebSocket connection");
        }
        self.open.store(false, Ordering::Release);
    }

    /// Whether the connection is still usable.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// The URL this connection was opened against.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for DuplexConnection {
    fn drop(&mut self) {
        self.close();
    }
}

async fn send_loop(
    mut sink: WsSink,
    mut outbound: mpsc::Receiver<String>,
    ping_interval: Duration,
    reader_done: CancellationToken,
    open: Arc<AtomicBool>,
) {
    let mut ping = interval_at(Instant::now() + ping_interval, ping_interval);
    ping.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            frame = outbound.recv() => match frame {
                Some(text) => {
                    trace!(len = text.len(), "Sending frame");
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        warn!(error = %e, "Failed to send WebSocket frame");
                        break;
                    }
                }
                None => {
                    if let Err(e) = sink.send(Message::Close(None)).await {
                        debug!(error = %e, "Failed to send close frame");
                    }
                    break;
                }
            },
            _ = ping.tick() => {
                if let Err(e) = sink.send(Message::Ping(Vec::new().into())).await {
                    warn!(error = %e, "Failed to send ping");
                    break;
                }
            }
            _ = reader_done.cancelled() => break,
        }
    }

    let _ = sink.close().await;
    open.store(false, Ordering::Release);
    debug!("WebSocket send loop stopped");
}

async fn receive_loop(
    mut source: WsSource,
    inbound: mpsc::Sender<String>,
    reader_done: CancellationToken,
    open: Arc<AtomicBool>,
) {
    while let Some(message) = source.next().await {
        let text = match message {
            Ok(Message::Text(text)) => text.as_str().to_owned(),
            Ok(Message::Binary(data)) => match String::from_utf8(data.to_vec()) {
                Ok(text) => text,
                Err(_) => {
                    warn!(len = data.len(), "Dropping non UTF-8 binary frame");
                    continue;
                }
            },
            Ok(Message::Close(frame)) => {
                debug!(?frame, "WebSocket closed by peer");
                break;
            }
            // Ping/pong are answered by tungstenite.
            Ok(_) => continue,
            Err(e) => {
                warn!(error = %e, "WebSocket read failed");
                break;
            }
        };

        if inbound.send(text).await.is_err() {
            debug!("Inbound queue dropped, stopping receive loop");
            break;
        }
    }

    open.store(false, Ordering::Release);
    reader_done.cancel();
    debug!("WebSocket receive loop stopped");
}
