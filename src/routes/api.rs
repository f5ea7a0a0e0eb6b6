//! REST route configuration.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the REST router.
///
/// # Endpoints
///
/// - `GET /healthz` - liveness probe
/// - `POST /api/gemini/text` - text generation proxy
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/healthz", get(handlers::api::health_check))
        .route("/api/gemini/text", post(handlers::text::text_handler))
        .layer(TraceLayer::new_for_http())
}
