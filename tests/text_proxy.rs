//! Text proxy integration tests against a mocked Gemini REST API.

use axum::{Router, body::Body, http::Request};
use tower::util::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use brainsait_gateway::{ServerConfig, core::gemini::GeminiVoice, routes, state::AppState};

fn config_with_text_endpoint(endpoint: String) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        tls: None,
        gemini_api_key: "test-key".to_string(),
        gemini_text_model: "gemini-2.5-pro".to_string(),
        gemini_live_model: "gemini-2.5-flash-native-audio-preview-09-2025".to_string(),
        gemini_live_voice: GeminiVoice::Zephyr,
        gemini_live_endpoint: None,
        gemini_text_endpoint: Some(endpoint),
        live_connect_timeout_secs: 2,
        copilot_locale: "ar-SA".to_string(),
        cors_allowed_origins: None,
        rate_limit_requests_per_second: 60,
        rate_limit_burst_size: 10,
    }
}

fn app(endpoint: String) -> Router {
    let state = AppState::new(config_with_text_endpoint(endpoint));
    routes::api::create_api_router().with_state(state)
}

async fn post_text(app: Router, body: &str) -> (axum::http::StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/gemini/text")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_text_proxy_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/gemini-2.5-pro:generateContent"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [
                {"content": {"parts": [{"text": "Generated answer."}]}}
            ],
            "modelVersion": "gemini-2.5-pro-001",
            "usageMetadata": {"totalTokenCount": 21}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, json) = post_text(app(server.uri()), r#"{"prompt": "Summarize Q3."}"#).await;

    assert_eq!(status, axum::http::StatusCode::OK);
    assert_eq!(json["text"], "Generated answer.");
    assert_eq!(json["modelVersion"], "gemini-2.5-pro-001");
    assert_eq!(json["usage"]["totalTokenCount"], 21);
}

#[tokio::test]
async fn test_text_proxy_honors_model_override() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "flash reply"}]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, json) = post_text(
        app(server.uri()),
        r#"{"prompt": "hi", "model": "gemini-2.5-flash"}"#,
    )
    .await;

    assert_eq!(status, axum::http::StatusCode::OK);
    assert_eq!(json["text"], "flash reply");
    // Optional fields are omitted, not null
    assert!(json.get("modelVersion").is_none());
}

#[tokio::test]
async fn test_text_proxy_maps_upstream_failure_to_500() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (status, json) = post_text(app(server.uri()), r#"{"prompt": "hi"}"#).await;

    assert_eq!(status, axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Gemini text proxy failed.");
}

#[tokio::test]
async fn test_text_proxy_empty_candidates_is_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": []
        })))
        .mount(&server)
        .await;

    let (status, json) = post_text(app(server.uri()), r#"{"prompt": "hi"}"#).await;

    assert_eq!(status, axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Gemini text proxy failed.");
}
