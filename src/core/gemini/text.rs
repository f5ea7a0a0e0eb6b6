//! Gemini text generation client.
//!
//! Thin wrapper over the `generateContent` REST API used by the text proxy
//! endpoint.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::config::GEMINI_API_BASE_URL;

/// Errors from the text generation API.
#[derive(Debug, Error)]
pub enum TextError {
    /// Transport-level failure
    #[error("Gemini request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the API
    #[error("Gemini returned status {0}")]
    UpstreamStatus(u16),

    /// The response carried no text candidates
    #[error("Gemini returned no text")]
    EmptyResponse,
}

/// Result type for text generation.
pub type TextResult<T> = Result<T, TextError>;

/// Outcome of a text generation call.
#[derive(Debug, Clone)]
pub struct GenerateTextOutcome {
    /// Concatenated candidate text
    pub text: String,
    /// Model version reported by the API
    pub model_version: Option<String>,
    /// Token usage metadata, passed through as-is
    pub usage: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
    model_version: Option<String>,
    usage_metadata: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidatePart {
    text: Option<String>,
}

/// Client for the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct TextClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl TextClient {
    /// Create a client; `base_url` overrides the public endpoint (tests).
    pub fn new(http: reqwest::Client, api_key: String, base_url: Option<String>) -> Self {
        Self {
            http,
            api_key,
            base_url: base_url.unwrap_or_else(|| GEMINI_API_BASE_URL.to_string()),
        }
    }

    /// Generate text for a prompt with the given model.
    pub async fn generate(&self, model: &str, prompt: &str) -> TextResult<GenerateTextOutcome> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self.http.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(TextError::UpstreamStatus(response.status().as_u16()));
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let text = parsed
            .candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(TextError::EmptyResponse);
        }

        Ok(GenerateTextOutcome {
            text,
            model_version: parsed.model_version,
            usage: parsed.usage_metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parsing() {
        let raw = serde_json::json!({
            "candidates": [
                {"content": {"parts": [{"text": "Hello"}, {"text": " world"}]}}
            ],
            "modelVersion": "gemini-2.5-pro-001",
            "usageMetadata": {"totalTokenCount": 12}
        });
        let parsed: GenerateContentResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.model_version.as_deref(), Some("gemini-2.5-pro-001"));
    }

    #[test]
    fn test_response_parsing_tolerates_missing_fields() {
        let parsed: GenerateContentResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(parsed.candidates.is_empty());
        assert!(parsed.model_version.is_none());
    }
}
