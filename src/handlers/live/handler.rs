//! Live relay WebSocket handler.
//!
//! One task per client connection. The handler opens the upstream Gemini
//! live session as soon as the client connects, queues any audio that
//! arrives while establishment is in flight, then becomes a pure
//! pass-through: client audio goes up, every upstream event comes down
//! wrapped in a `gemini` envelope. Closing either side closes the other —
//! no orphaned sessions.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::core::audio::{AudioChunk, PendingQueue};
use crate::core::gemini::{LiveError, LiveEvent, LiveSessionHandle, live};
use crate::state::AppState;

use super::messages::{ClientEnvelope, ControlAction, MessageRoute, RelayStatus, ServerEnvelope};

/// Channel buffer size for outgoing envelopes.
const CHANNEL_BUFFER_SIZE: usize = 1024;

/// Fixed client-facing text for establishment failures.
const ESTABLISH_FAILED_MESSAGE: &str = "Unable to establish Gemini live session.";

/// Fixed client-facing text for unparseable payloads.
const INVALID_PAYLOAD_MESSAGE: &str = "Invalid payload received.";

type ConnectResult = Result<(LiveSessionHandle, mpsc::Receiver<LiveEvent>), LiveError>;

/// Live relay WebSocket handler.
///
/// Upgrades the HTTP connection and hands the socket to the per-connection
/// relay loop.
pub async fn live_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_live_socket(socket, state))
}

/// Run the relay for one client connection.
async fn handle_live_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = Uuid::new_v4();
    info!(%connection_id, "gemini_live_connection");

    let (mut sender, mut receiver) = socket.split();
    let (route_tx, mut route_rx) = mpsc::channel::<MessageRoute>(CHANNEL_BUFFER_SIZE);

    // Sender task for outgoing envelopes
    let sender_task = tokio::spawn(async move {
        while let Some(route) = route_rx.recv().await {
            let result = match route {
                MessageRoute::Outgoing(envelope) => match serde_json::to_string(&envelope) {
                    Ok(json) => sender.send(Message::Text(json.into())).await,
                    Err(e) => {
                        error!("Failed to serialize outgoing envelope: {}", e);
                        continue;
                    }
                },
                MessageRoute::Close => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            };

            if let Err(e) = result {
                debug!("Failed to send WebSocket message: {}", e);
                break;
            }
        }
    });

    // Establish the upstream session immediately; audio that arrives in the
    // meantime waits in the pending queue.
    let live_config = state.live_config();
    let mut connect_task: Option<JoinHandle<ConnectResult>> =
        Some(tokio::spawn(async move { live::connect(&live_config).await }));

    let mut session: Option<LiveSessionHandle> = None;
    let mut pending = PendingQueue::new();
    let mut events: Option<mpsc::Receiver<LiveEvent>> = None;

    loop {
        tokio::select! {
            result = poll_connect(&mut connect_task), if connect_task.is_some() => {
                connect_task = None;
                match result {
                    Ok((handle, event_rx)) => {
                        let _ = route_tx
                            .send(MessageRoute::Outgoing(ServerEnvelope::Status {
                                status: RelayStatus::Connected,
                            }))
                            .await;

                        let queued = pending.drain();
                        let queued_len = queued.len();
                        for chunk in queued {
                            if let Err(e) = handle.send_audio(&chunk).await {
                                warn!(%connection_id, "Failed to flush queued audio: {}", e);
                                break;
                            }
                        }

                        info!(%connection_id, flushed = queued_len, "gemini_live_ready");
                        session = Some(handle);
                        events = Some(event_rx);
                    }
                    Err(e) => {
                        error!(%connection_id, "Failed to open Gemini live session: {}", e);
                        let message = match e {
                            LiveError::EstablishTimeout(_) => e.to_string(),
                            _ => ESTABLISH_FAILED_MESSAGE.to_string(),
                        };
                        let _ = route_tx
                            .send(MessageRoute::Outgoing(ServerEnvelope::Error {
                                message: Some(message),
                            }))
                            .await;
                        let _ = route_tx.send(MessageRoute::Close).await;
                        break;
                    }
                }
            }

            msg_result = receiver.next() => {
                match msg_result {
                    Some(Ok(msg)) => {
                        if !process_client_message(msg, &session, &mut pending, &route_tx).await {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        warn!(%connection_id, "Client WebSocket error: {}", e);
                        break;
                    }
                    None => {
                        info!(%connection_id, "gemini_live_disconnected");
                        break;
                    }
                }
            }

            event = poll_events(&mut events) => {
                match event {
                    Some(LiveEvent::Message(payload)) => {
                        let _ = route_tx
                            .send(MessageRoute::Outgoing(ServerEnvelope::Gemini { payload }))
                            .await;
                    }
                    Some(LiveEvent::Error(message)) => {
                        error!(%connection_id, "Gemini live session error: {}", message);
                        let _ = route_tx
                            .send(MessageRoute::Outgoing(ServerEnvelope::Error {
                                message: Some(message),
                            }))
                            .await;
                        let _ = route_tx.send(MessageRoute::Close).await;
                        break;
                    }
                    Some(LiveEvent::Closed) | None => {
                        info!(%connection_id, "Gemini live session closed");
                        let _ = route_tx
                            .send(MessageRoute::Outgoing(ServerEnvelope::Status {
                                status: RelayStatus::Closed,
                            }))
                            .await;
                        let _ = route_tx.send(MessageRoute::Close).await;
                        break;
                    }
                }
            }
        }
    }

    // No upstream session may outlive its client connection.
    if let Some(handle) = session.take() {
        handle.close().await;
    }
    if let Some(task) = connect_task.take() {
        task.abort();
        if let Ok(Ok((handle, _events))) = task.await {
            handle.close().await;
        }
    }

    sender_task.abort();
    debug!(%connection_id, "Live relay connection terminated");
}

/// Await a pending establishment task, flattening join errors.
async fn poll_connect(task: &mut Option<JoinHandle<ConnectResult>>) -> ConnectResult {
    match task.as_mut() {
        Some(task) => match task.await {
            Ok(result) => result,
            Err(e) => Err(LiveError::Connect(format!("establishment task failed: {e}"))),
        },
        None => std::future::pending().await,
    }
}

/// Await the next upstream event, or park when none are flowing yet.
async fn poll_events(events: &mut Option<mpsc::Receiver<LiveEvent>>) -> Option<LiveEvent> {
    match events.as_mut() {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Process one client frame. Returns false when the connection should end.
async fn process_client_message(
    msg: Message,
    session: &Option<LiveSessionHandle>,
    pending: &mut PendingQueue,
    route_tx: &mpsc::Sender<MessageRoute>,
) -> bool {
    let envelope = match &msg {
        Message::Text(text) => serde_json::from_str::<ClientEnvelope>(text.as_str()),
        Message::Binary(data) => serde_json::from_slice::<ClientEnvelope>(data),
        Message::Close(_) => return false,
        // Ping/Pong are handled by the WebSocket layer
        _ => return true,
    };

    let envelope = match envelope {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("Failed to parse client payload: {}", e);
            let _ = route_tx
                .send(MessageRoute::Outgoing(ServerEnvelope::Error {
                    message: Some(INVALID_PAYLOAD_MESSAGE.to_string()),
                }))
                .await;
            return true;
        }
    };

    match envelope {
        ClientEnvelope::Audio { data, mime_type } => {
            let chunk = AudioChunk::new(data, mime_type);
            match session {
                Some(handle) => {
                    if let Err(e) = handle.send_audio(&chunk).await {
                        // Terminal state arrives through the event stream.
                        warn!("Failed to forward audio upstream: {}", e);
                    }
                }
                None => pending.push(chunk),
            }
            true
        }
        ClientEnvelope::Control {
            action: ControlAction::Stop,
        } => {
            if let Some(handle) = session {
                handle.close().await;
            }
            let _ = route_tx.send(MessageRoute::Close).await;
            false
        }
    }
}
