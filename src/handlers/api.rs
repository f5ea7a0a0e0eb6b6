//! Health check endpoint.

use axum::Json;

/// `GET /healthz`
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
