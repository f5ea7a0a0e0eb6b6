//! Gemini Live session client.
//!
//! Connects to the bidirectional generate-content WebSocket, sends the
//! session setup frame, and then exposes two halves:
//!
//! - a [`LiveSessionHandle`] for streaming audio upstream and closing the
//!   session
//! - an event receiver carrying every upstream frame, opaquely, plus
//!   terminal error/close notifications
//!
//! Upstream frames are parsed only as far as "is this JSON" — their content
//! is never interpreted here. The relay forwards them to the browser client
//! verbatim, which insulates this process from upstream schema changes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use super::config::{GEMINI_LIVE_URL, LiveConfig};
use super::messages::{RealtimeInputMessage, SetupMessage};
use crate::core::audio::AudioChunk;

/// Channel capacity for outbound frames to the upstream session.
const OUTBOUND_CHANNEL_CAPACITY: usize = 256;

/// Channel capacity for upstream events delivered to the relay.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Errors that can occur on the upstream live session.
#[derive(Debug, Error)]
pub enum LiveError {
    /// Connecting to the upstream endpoint failed
    #[error("Failed to connect to Gemini live endpoint: {0}")]
    Connect(String),

    /// The session did not establish within the configured bound
    #[error("Gemini live session establishment timed out after {0}s")]
    EstablishTimeout(u64),

    /// The endpoint URL could not be constructed
    #[error("Invalid Gemini live endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    /// A frame could not be serialized
    #[error("Failed to serialize live frame: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The session is no longer open
    #[error("Gemini live session is closed")]
    SessionClosed,
}

/// Result type for live session operations.
pub type LiveResult<T> = Result<T, LiveError>;

/// Events emitted by the upstream session after establishment.
#[derive(Debug)]
pub enum LiveEvent {
    /// One upstream frame, passed through without interpretation
    Message(serde_json::Value),
    /// The upstream session reported an error
    Error(String),
    /// The upstream session closed
    Closed,
}

enum OutboundFrame {
    Audio(Box<RealtimeInputMessage>),
    Close,
}

/// Handle to an established upstream session.
///
/// Cloneable; all clones share the session. Closing is idempotent.
#[derive(Clone)]
pub struct LiveSessionHandle {
    outbound: mpsc::Sender<OutboundFrame>,
    closed: Arc<AtomicBool>,
}

impl LiveSessionHandle {
    /// Forward one audio chunk to the upstream session.
    pub async fn send_audio(&self, chunk: &AudioChunk) -> LiveResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(LiveError::SessionClosed);
        }

        let frame = OutboundFrame::Audio(Box::new(RealtimeInputMessage::from_chunk(chunk)));
        self.outbound
            .send(frame)
            .await
            .map_err(|_| LiveError::SessionClosed)
    }

    /// Close the upstream session. Safe to call more than once.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.outbound.send(OutboundFrame::Close).await;
    }

    /// Whether the session has been closed from this side.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Build the live endpoint URL with the API key attached.
fn build_live_url(config: &LiveConfig) -> LiveResult<Url> {
    let base = config.endpoint.as_deref().unwrap_or(GEMINI_LIVE_URL);
    let mut url = Url::parse(base)?;
    url.query_pairs_mut().append_pair("key", &config.api_key);
    Ok(url)
}

/// Establish an upstream live session.
///
/// Completes once the WebSocket handshake is done and the setup frame has
/// been accepted by the transport, bounded by `config.connect_timeout`.
/// Afterwards the session runs in a background task until either side
/// closes it; dropping the event receiver does not tear the session down,
/// closing the handle does.
pub async fn connect(
    config: &LiveConfig,
) -> LiveResult<(LiveSessionHandle, mpsc::Receiver<LiveEvent>)> {
    let url = build_live_url(config)?;
    let timeout_secs = config.connect_timeout.as_secs();

    let ws_stream = timeout(config.connect_timeout, async {
        let (stream, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| LiveError::Connect(e.to_string()))?;
        Ok::<_, LiveError>(stream)
    })
    .await
    .map_err(|_| LiveError::EstablishTimeout(timeout_secs))??;

    let (mut ws_sink, mut ws_source) = ws_stream.split();

    // The setup frame must be the first message on the socket.
    let setup = serde_json::to_string(&SetupMessage::from_config(config))?;
    timeout(config.connect_timeout, ws_sink.send(Message::Text(setup.into())))
        .await
        .map_err(|_| LiveError::EstablishTimeout(timeout_secs))?
        .map_err(|e| LiveError::Connect(e.to_string()))?;

    tracing::info!(model = %config.model, "Gemini live session established");

    let (outbound_tx, mut outbound_rx) = mpsc::channel::<OutboundFrame>(OUTBOUND_CHANNEL_CAPACITY);
    let (event_tx, event_rx) = mpsc::channel::<LiveEvent>(EVENT_CHANNEL_CAPACITY);

    let closed = Arc::new(AtomicBool::new(false));
    let task_closed = closed.clone();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                frame = outbound_rx.recv() => {
                    match frame {
                        Some(OutboundFrame::Audio(message)) => {
                            let json = match serde_json::to_string(&message) {
                                Ok(json) => json,
                                Err(e) => {
                                    tracing::error!("Failed to serialize realtime input: {}", e);
                                    continue;
                                }
                            };
                            if let Err(e) = ws_sink.send(Message::Text(json.into())).await {
                                tracing::warn!("Failed to send audio upstream: {}", e);
                                let _ = event_tx.send(LiveEvent::Error(e.to_string())).await;
                                break;
                            }
                        }
                        Some(OutboundFrame::Close) | None => {
                            let _ = ws_sink.send(Message::Close(None)).await;
                            let _ = event_tx.send(LiveEvent::Closed).await;
                            break;
                        }
                    }
                }

                msg = ws_source.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            match serde_json::from_str::<serde_json::Value>(text.as_str()) {
                                Ok(payload) => {
                                    if event_tx.send(LiveEvent::Message(payload)).await.is_err() {
                                        break;
                                    }
                                }
                                Err(e) => {
                                    tracing::warn!("Dropping unparseable upstream frame: {}", e);
                                }
                            }
                        }
                        Some(Ok(Message::Binary(data))) => {
                            // The live API may deliver JSON frames as binary.
                            match serde_json::from_slice::<serde_json::Value>(&data) {
                                Ok(payload) => {
                                    if event_tx.send(LiveEvent::Message(payload)).await.is_err() {
                                        break;
                                    }
                                }
                                Err(e) => {
                                    tracing::warn!("Dropping unparseable upstream frame: {}", e);
                                }
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            if let Err(e) = ws_sink.send(Message::Pong(data)).await {
                                tracing::warn!("Failed to send pong upstream: {}", e);
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            let _ = event_tx.send(LiveEvent::Closed).await;
                            break;
                        }
                        Some(Err(e)) => {
                            tracing::warn!("Upstream WebSocket error: {}", e);
                            let _ = event_tx.send(LiveEvent::Error(e.to_string())).await;
                            break;
                        }
                        _ => {}
                    }
                }
            }
        }

        task_closed.store(true, Ordering::SeqCst);
        tracing::debug!("Gemini live session task ended");
    });

    Ok((
        LiveSessionHandle {
            outbound: outbound_tx,
            closed,
        },
        event_rx,
    ))
}
