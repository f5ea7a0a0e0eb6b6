//! Client-side view of relayed model events.
//!
//! The relay passes upstream payloads through untouched; the client is the
//! only place they are interpreted. Parsing is lenient: unknown fields are
//! ignored and a payload that does not match this shape is simply empty.

use serde::Deserialize;

/// One relayed live server payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LiveServerPayload {
    pub server_content: Option<ServerContent>,
}

impl LiveServerPayload {
    /// Parse a relayed payload, tolerating anything that does not match.
    pub fn parse(value: &serde_json::Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }
}

/// Content portion of a live server payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerContent {
    pub model_turn: Option<ModelTurn>,
    pub input_transcription: Option<Transcription>,
    pub output_transcription: Option<Transcription>,
    pub turn_complete: Option<bool>,
}

/// One model turn, made of text and/or inline audio parts.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelTurn {
    pub parts: Vec<ContentPart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentPart {
    pub text: Option<String>,
    pub inline_data: Option<InlineData>,
}

/// Base64 media embedded directly in a model response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InlineData {
    pub data: String,
    pub mime_type: String,
}

impl InlineData {
    /// Whether this payload carries audio.
    pub fn is_audio(&self) -> bool {
        self.mime_type.starts_with("audio/")
    }
}

/// Speech-to-text output, interim or finished.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transcription {
    pub text: Option<String>,
    pub finished: Option<bool>,
}
