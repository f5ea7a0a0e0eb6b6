//! Gemini text proxy handler.
//!
//! `POST /api/gemini/text` forwards a prompt to the Gemini `generateContent`
//! API and returns the generated text. Request and response shapes mirror
//! what the Business-in-a-Box front end expects.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// Default role attributed to a request that does not carry one.
const DEFAULT_USER_ROLE: &str = "provider";

/// Text proxy request body.
///
/// `prompt` is kept as a raw JSON value so a missing or non-string prompt
/// yields the fixed 400 error body rather than a deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct TextProxyRequest {
    #[serde(default)]
    pub prompt: Option<serde_json::Value>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default, rename = "userRole")]
    pub user_role: Option<String>,
}

/// Text proxy response body.
#[derive(Debug, Serialize)]
pub struct TextProxyResponse {
    pub text: String,
    #[serde(rename = "modelVersion", skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<serde_json::Value>,
}

/// `POST /api/gemini/text`
pub async fn text_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TextProxyRequest>,
) -> AppResult<Json<TextProxyResponse>> {
    let Some(prompt) = request.prompt.as_ref().and_then(serde_json::Value::as_str) else {
        return Err(AppError::BadRequest("Prompt is required.".to_string()));
    };

    let model = request
        .model
        .unwrap_or_else(|| state.config.gemini_text_model.clone());
    let locale = request
        .locale
        .unwrap_or_else(|| state.config.copilot_locale.clone());
    let user_role = request
        .user_role
        .unwrap_or_else(|| DEFAULT_USER_ROLE.to_string());

    info!(%user_role, %locale, %model, "gemini_text_request");

    match state.text_client.generate(&model, prompt).await {
        Ok(outcome) => {
            info!(
                model_version = outcome.model_version.as_deref().unwrap_or(""),
                "gemini_text_response"
            );
            Ok(Json(TextProxyResponse {
                text: outcome.text,
                model_version: outcome.model_version,
                usage: outcome.usage,
            }))
        }
        Err(e) => {
            error!("Gemini text proxy failed: {}", e);
            Err(AppError::UpstreamFailed("Gemini text proxy failed.".to_string()))
        }
    }
}
