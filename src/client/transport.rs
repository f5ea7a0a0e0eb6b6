//! Client-side relay transport.
//!
//! Owns the WebSocket connection to the relay. Audio chunks produced before
//! the connection is open wait in a pending queue and are flushed in FIFO
//! order on open; inbound frames are parsed into envelopes and surfaced as
//! [`RelayEvent`]s. Stopping is idempotent, and every terminal transition
//! releases the connection state exactly once.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};
use url::Url;

use crate::core::audio::{AudioChunk, PendingQueue};
use crate::handlers::live::messages::{ClientEnvelope, RelayStatus, ServerEnvelope};

/// Path of the relay WebSocket endpoint.
pub const RELAY_WS_PATH: &str = "/ws/gemini-live";

/// Channel capacity for outbound envelopes.
const OUTBOUND_CHANNEL_CAPACITY: usize = 256;

/// Channel capacity for events delivered to the embedder.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Errors from the relay transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No way to reach the relay was configured
    #[error("No relay endpoint configured")]
    NoEndpoint,

    /// The configured endpoint could not be turned into a WebSocket URL
    #[error("Invalid relay endpoint: {0}")]
    InvalidEndpoint(String),

    /// Connecting to the relay failed
    #[error("Failed to connect to relay: {0}")]
    Connect(String),

    /// The transport was already started
    #[error("Transport already started")]
    AlreadyStarted,

    /// The transport has closed
    #[error("Transport is closed")]
    Closed,
}

/// Transport connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    /// Not yet connected
    #[default]
    Idle,
    /// WebSocket handshake in flight
    Connecting,
    /// Connected; chunks are sent immediately
    Open,
    /// Terminal
    Closed,
}

/// Where to find the relay, in preference order.
#[derive(Debug, Clone, Default)]
pub struct RelayEndpoints {
    /// Explicit WebSocket URL override
    pub ws_url: Option<String>,
    /// HTTP API base; the relay URL is derived by swapping the scheme
    pub api_base_url: Option<String>,
    /// Current page origin, the last resort
    pub page_origin: Option<String>,
}

impl RelayEndpoints {
    /// Resolve the relay WebSocket URL.
    pub fn relay_url(&self) -> Result<Url, TransportError> {
        if let Some(ws_url) = &self.ws_url {
            let url = Url::parse(ws_url)
                .map_err(|e| TransportError::InvalidEndpoint(e.to_string()))?;
            if url.scheme() != "ws" && url.scheme() != "wss" {
                return Err(TransportError::InvalidEndpoint(format!(
                    "expected ws:// or wss:// URL, got {ws_url}"
                )));
            }
            return Ok(url);
        }

        if let Some(base) = self.api_base_url.as_deref().or(self.page_origin.as_deref()) {
            return derive_ws_url(base);
        }

        Err(TransportError::NoEndpoint)
    }
}

/// Derive the relay URL from an HTTP origin by swapping the scheme and
/// appending the relay path.
fn derive_ws_url(base: &str) -> Result<Url, TransportError> {
    let mut url =
        Url::parse(base).map_err(|e| TransportError::InvalidEndpoint(e.to_string()))?;

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(TransportError::InvalidEndpoint(format!(
                "cannot derive WebSocket URL from {other}:// base"
            )));
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| TransportError::InvalidEndpoint(base.to_string()))?;

    url.join(RELAY_WS_PATH)
        .map_err(|e| TransportError::InvalidEndpoint(e.to_string()))
}

/// Events surfaced to the embedder.
#[derive(Debug)]
pub enum RelayEvent {
    /// The relay reported its upstream session is established
    Connected,
    /// A relayed model event; interpreted by the transcript assembler and
    /// playback scheduler
    Payload(serde_json::Value),
    /// The relay reported an error; recording stops, the user retries
    Error(String),
    /// Terminal: the connection is gone. Emitted exactly once.
    SessionClosed,
}

enum OutboundFrame {
    Envelope(ClientEnvelope),
    Close,
}

/// State shared with the connection task.
struct Shared {
    state: RwLock<TransportState>,
    open: AtomicBool,
    recording: AtomicBool,
    cleaned_up: AtomicBool,
    ws_sender: Mutex<Option<mpsc::Sender<OutboundFrame>>>,
    events_tx: mpsc::Sender<RelayEvent>,
}

impl Shared {
    /// Release connection state and emit the terminal event. Runs its body
    /// at most once no matter how many paths race into it.
    async fn finish(&self) {
        if self.cleaned_up.swap(true, Ordering::SeqCst) {
            return;
        }
        *self.state.write() = TransportState::Closed;
        self.open.store(false, Ordering::SeqCst);
        self.recording.store(false, Ordering::SeqCst);
        *self.ws_sender.lock() = None;
        let _ = self.events_tx.send(RelayEvent::SessionClosed).await;
    }
}

/// WebSocket transport to the live relay.
pub struct RelayTransport {
    endpoints: RelayEndpoints,
    shared: Arc<Shared>,
    queue: Mutex<PendingQueue>,
    connection_task: Mutex<Option<JoinHandle<()>>>,
}

impl RelayTransport {
    /// Create a transport and the event stream it will feed.
    pub fn new(endpoints: RelayEndpoints) -> (Self, mpsc::Receiver<RelayEvent>) {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let transport = Self {
            endpoints,
            shared: Arc::new(Shared {
                state: RwLock::new(TransportState::Idle),
                open: AtomicBool::new(false),
                recording: AtomicBool::new(false),
                cleaned_up: AtomicBool::new(false),
                ws_sender: Mutex::new(None),
                events_tx,
            }),
            queue: Mutex::new(PendingQueue::new()),
            connection_task: Mutex::new(None),
        };
        (transport, events_rx)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TransportState {
        *self.shared.state.read()
    }

    /// Whether the connection is open.
    pub fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::SeqCst)
    }

    /// Whether a recording session is active.
    pub fn is_recording(&self) -> bool {
        self.shared.recording.load(Ordering::SeqCst)
    }

    /// Chunks waiting for the connection to open.
    pub fn queued(&self) -> usize {
        self.queue.lock().len()
    }

    /// Connect to the relay and flush anything queued so far.
    pub async fn connect(&self) -> Result<(), TransportError> {
        {
            let mut state = self.shared.state.write();
            match *state {
                TransportState::Idle => *state = TransportState::Connecting,
                TransportState::Closed => return Err(TransportError::Closed),
                _ => return Err(TransportError::AlreadyStarted),
            }
        }

        let url = match self.endpoints.relay_url() {
            Ok(url) => url,
            Err(e) => {
                self.shared.finish().await;
                return Err(e);
            }
        };
        debug!(%url, "Connecting to relay");

        let ws_stream = match tokio_tungstenite::connect_async(url.as_str()).await {
            Ok((stream, _response)) => stream,
            Err(e) => {
                self.shared.finish().await;
                return Err(TransportError::Connect(e.to_string()));
            }
        };

        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CHANNEL_CAPACITY);
        *self.shared.ws_sender.lock() = Some(outbound_tx.clone());
        *self.shared.state.write() = TransportState::Open;
        self.shared.open.store(true, Ordering::SeqCst);
        self.shared.recording.store(true, Ordering::SeqCst);

        let task = tokio::spawn(run_connection(ws_stream, outbound_rx, self.shared.clone()));
        *self.connection_task.lock() = Some(task);

        // Drain in FIFO order, one envelope per chunk.
        let queued = self.queue.lock().drain();
        for chunk in queued {
            if outbound_tx
                .send(OutboundFrame::Envelope(ClientEnvelope::audio(chunk)))
                .await
                .is_err()
            {
                return Err(TransportError::Closed);
            }
        }

        Ok(())
    }

    /// Submit one audio chunk: queued until the connection opens, sent
    /// immediately afterwards.
    pub async fn send_chunk(&self, chunk: AudioChunk) -> Result<(), TransportError> {
        match self.state() {
            TransportState::Closed => return Err(TransportError::Closed),
            TransportState::Idle | TransportState::Connecting => {
                self.queue.lock().push(chunk);
                return Ok(());
            }
            TransportState::Open => {}
        }

        let sender = self.shared.ws_sender.lock().clone();
        match sender {
            Some(tx) => tx
                .send(OutboundFrame::Envelope(ClientEnvelope::audio(chunk)))
                .await
                .map_err(|_| TransportError::Closed),
            None => Err(TransportError::Closed),
        }
    }

    /// Stop the session: best-effort `control: stop`, then close. Calling
    /// this on an already-stopped transport is a no-op.
    pub async fn stop(&self) {
        let sender = self.shared.ws_sender.lock().clone();
        if let Some(tx) = sender {
            // Send failures are swallowed; the socket is closing anyway.
            let _ = tx.send(OutboundFrame::Envelope(ClientEnvelope::stop())).await;
            let _ = tx.send(OutboundFrame::Close).await;
        }
        self.shared.finish().await;
    }
}

/// Connection task: pumps outbound envelopes and parses inbound frames
/// until either side closes.
async fn run_connection<S>(
    ws_stream: tokio_tungstenite::WebSocketStream<S>,
    mut outbound_rx: mpsc::Receiver<OutboundFrame>,
    shared: Arc<Shared>,
) where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let (mut ws_sink, mut ws_source) = ws_stream.split();

    loop {
        tokio::select! {
            frame = outbound_rx.recv() => {
                match frame {
                    Some(OutboundFrame::Envelope(envelope)) => {
                        let json = match serde_json::to_string(&envelope) {
                            Ok(json) => json,
                            Err(e) => {
                                warn!("Failed to serialize envelope: {}", e);
                                continue;
                            }
                        };
                        if let Err(e) = ws_sink.send(Message::Text(json.into())).await {
                            debug!("Relay send failed: {}", e);
                            break;
                        }
                    }
                    Some(OutboundFrame::Close) | None => {
                        let _ = ws_sink.send(Message::Close(None)).await;
                        break;
                    }
                }
            }

            msg = ws_source.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_inbound(text.as_str(), &shared).await;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = ws_sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("Relay connection closed");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!("Relay WebSocket error: {}", e);
                        let _ = shared
                            .events_tx
                            .send(RelayEvent::Error(e.to_string()))
                            .await;
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    shared.finish().await;
}

/// Parse and dispatch one inbound relay frame. Malformed JSON is logged
/// and dropped; it never terminates the session.
async fn handle_inbound(text: &str, shared: &Shared) {
    let envelope = match serde_json::from_str::<ServerEnvelope>(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("Dropping malformed relay frame: {}", e);
            return;
        }
    };

    match envelope {
        ServerEnvelope::Status {
            status: RelayStatus::Connected,
        } => {
            let _ = shared.events_tx.send(RelayEvent::Connected).await;
        }
        ServerEnvelope::Status {
            status: RelayStatus::Closed,
        } => {
            shared.recording.store(false, Ordering::SeqCst);
        }
        ServerEnvelope::Error { message } => {
            let _ = shared
                .events_tx
                .send(RelayEvent::Error(message.unwrap_or_default()))
                .await;
        }
        ServerEnvelope::Gemini { payload } => {
            let _ = shared.events_tx.send(RelayEvent::Payload(payload)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_url_prefers_explicit_override() {
        let endpoints = RelayEndpoints {
            ws_url: Some("wss://relay.example.com/ws/gemini-live".to_string()),
            api_base_url: Some("https://api.example.com".to_string()),
            page_origin: None,
        };
        assert_eq!(
            endpoints.relay_url().unwrap().as_str(),
            "wss://relay.example.com/ws/gemini-live"
        );
    }

    #[test]
    fn test_relay_url_rejects_http_override() {
        let endpoints = RelayEndpoints {
            ws_url: Some("https://relay.example.com".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            endpoints.relay_url(),
            Err(TransportError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_relay_url_derived_from_api_base() {
        let endpoints = RelayEndpoints {
            api_base_url: Some("http://localhost:4000".to_string()),
            ..Default::default()
        };
        assert_eq!(
            endpoints.relay_url().unwrap().as_str(),
            "ws://localhost:4000/ws/gemini-live"
        );

        let endpoints = RelayEndpoints {
            api_base_url: Some("https://api.example.com/v1/".to_string()),
            ..Default::default()
        };
        assert_eq!(
            endpoints.relay_url().unwrap().as_str(),
            "wss://api.example.com/ws/gemini-live"
        );
    }

    #[test]
    fn test_relay_url_falls_back_to_page_origin() {
        let endpoints = RelayEndpoints {
            page_origin: Some("https://app.example.com".to_string()),
            ..Default::default()
        };
        assert_eq!(
            endpoints.relay_url().unwrap().as_str(),
            "wss://app.example.com/ws/gemini-live"
        );
    }

    #[test]
    fn test_relay_url_requires_some_endpoint() {
        assert!(matches!(
            RelayEndpoints::default().relay_url(),
            Err(TransportError::NoEndpoint)
        ));
    }

    #[tokio::test]
    async fn test_chunks_queue_while_idle() {
        let (transport, _events) = RelayTransport::new(RelayEndpoints::default());
        assert_eq!(transport.state(), TransportState::Idle);

        for label in ["a", "b", "c"] {
            transport
                .send_chunk(AudioChunk::new(label.to_string(), None))
                .await
                .unwrap();
        }
        assert_eq!(transport.queued(), 3);
        assert!(!transport.is_open());
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let (transport, mut events) = RelayTransport::new(RelayEndpoints::default());

        transport.stop().await;
        assert_eq!(transport.state(), TransportState::Closed);
        assert!(!transport.is_recording());

        // Second stop is a no-op, and exactly one terminal event exists.
        transport.stop().await;
        assert!(matches!(events.recv().await, Some(RelayEvent::SessionClosed)));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_send_after_stop_fails() {
        let (transport, _events) = RelayTransport::new(RelayEndpoints::default());
        transport.stop().await;
        assert!(matches!(
            transport.send_chunk(AudioChunk::new("x".to_string(), None)).await,
            Err(TransportError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_connect_after_stop_fails() {
        let (transport, _events) = RelayTransport::new(RelayEndpoints {
            ws_url: Some("ws://127.0.0.1:1/ws/gemini-live".to_string()),
            ..Default::default()
        });
        transport.stop().await;
        assert!(matches!(
            transport.connect().await,
            Err(TransportError::Closed)
        ));
    }
}
