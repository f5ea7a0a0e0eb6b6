//! Live relay WebSocket route configuration.
//!
//! # Endpoint
//!
//! `GET /ws/gemini-live` - WebSocket upgrade for the live audio relay
//!
//! # Protocol
//!
//! After the upgrade, clients send JSON envelopes:
//!
//! ```json
//! {"type": "audio", "data": "<base64 pcm>", "mimeType": "audio/pcm;rate=16000"}
//! {"type": "control", "action": "stop"}
//! ```
//!
//! The server responds with:
//!
//! - `{"type": "status", "status": "connected"}` once the upstream session
//!   is established (audio sent earlier is queued, then flushed in order)
//! - `{"type": "gemini", "payload": ...}` for every upstream event
//! - `{"type": "error", "message": ...}` then close on failure
//! - `{"type": "status", "status": "closed"}` then close when the upstream
//!   session ends

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::live::live_handler;
use crate::state::AppState;

/// Create the live relay router.
pub fn create_live_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ws/gemini-live", get(live_handler))
        .layer(TraceLayer::new_for_http())
}
