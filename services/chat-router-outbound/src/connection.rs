use crate::chunking::{chunk_text, DEFAULT_CHUNK_CAP};
use crate::protocol::IncomingFrame;
use crate::sink::PlatformSink;
use chat_router_types::{Direction, Platform, TimelineEntry};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use tracing::{error, info, warn};

const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Mirrors the adapter's connection lifecycle: `Disconnected ->
/// Connecting -> Open -> Closing -> Disconnected`. Exposed mainly so
/// tests and diagnostics logging can observe it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
    Closing,
}

pub struct Adapter {
    platform: Platform,
    ws_url: String,
    sink: Arc<dyn PlatformSink>,
    chunk_cap: usize,
}

impl Adapter {
    pub fn new(platform: Platform, ws_url: impl Into<String>, sink: Arc<dyn PlatformSink>) -> Self {
        Self {
            platform,
            ws_url: ws_url.into(),
            sink,
            chunk_cap: DEFAULT_CHUNK_CAP,
        }
    }

    /// Runs the connect/session/reconnect loop until `shutdown` signals
    /// true. The reconnect timer is raced against the shutdown signal so
    /// an intentional shutdown cancels a pending reconnect immediately.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                return;
            }

            let mut state = ConnectionState::Connecting;
            info!(?state, url = %self.ws_url, "connecting to stream adapter");

            match tokio_tungstenite::connect_async(&self.ws_url).await {
                Ok((stream, _response)) => {
                    state = ConnectionState::Open;
                    info!(?state, "stream connection established");
                    self.run_session(stream, &mut shutdown).await;
                    state = ConnectionState::Closing;
                    info!(?state, "stream session ended");
                }
                Err(err) => {
                    error!(error = %err, "failed to connect to stream adapter");
                }
            }

            if *shutdown.borrow() {
                return;
            }

            tokio::select! {
                _ = tokio::time::sleep(RECONNECT_DELAY) => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return;
                    }
                }
            }
        }
    }

    async fn run_session(
        &self,
        mut stream: tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
        shutdown: &mut watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                message = stream.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_frame(&text).await;
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            info!("stream socket closed by server");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(err)) => {
                            warn!(error = %err, "stream socket error");
                            break;
                        }
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        let _ = stream.close(None).await;
                        break;
                    }
                }
            }
        }
    }

    async fn handle_frame(&self, raw: &str) {
        let frame: IncomingFrame = match serde_json::from_str(raw) {
            Ok(f) => f,
            Err(err) => {
                warn!(error = %err, "ignoring malformed stream frame");
                return;
            }
        };
        if let IncomingFrame::NewMessage { entry } = frame {
            self.deliver_if_eligible(entry).await;
        }
    }

    async fn deliver_if_eligible(&self, entry: TimelineEntry) {
        if entry.direction != Direction::Out || entry.platform != self.platform {
            return;
        }
        let Some(text) = entry.text.as_deref().filter(|t| !t.is_empty()) else {
            return;
        };

        for chunk in chunk_text(text, self.chunk_cap) {
            if let Err(err) = self.sink.send(&entry.platform_chat_id, &chunk).await {
                // Delivery errors are logged and swallowed: they must
                // not disconnect the socket or halt subsequent pushes.
                error!(error = %err, chat_id = %entry.platform_chat_id, "delivery failed");
            }
        }
    }
}
