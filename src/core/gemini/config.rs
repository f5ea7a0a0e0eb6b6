//! Gemini API configuration types.
//!
//! This module contains the endpoint constants and configuration for the
//! Gemini Live WebSocket session and the `generateContent` REST API.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Gemini Live (bidirectional generate content) WebSocket endpoint.
pub const GEMINI_LIVE_URL: &str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";

/// Gemini REST models endpoint base.
pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Default model for the live audio session.
pub const DEFAULT_LIVE_MODEL: &str = "gemini-2.5-flash-native-audio-preview-09-2025";

/// Default model for text generation.
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-pro";

/// Default establishment timeout for the live session.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 15;

// =============================================================================
// Voices
// =============================================================================

/// Prebuilt voices for Gemini native audio output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GeminiVoice {
    /// Zephyr voice (default)
    #[default]
    Zephyr,
    /// Puck voice
    Puck,
    /// Charon voice
    Charon,
    /// Kore voice
    Kore,
    /// Fenrir voice
    Fenrir,
    /// Aoede voice
    Aoede,
}

impl GeminiVoice {
    /// Convert to the API parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zephyr => "Zephyr",
            Self::Puck => "Puck",
            Self::Charon => "Charon",
            Self::Kore => "Kore",
            Self::Fenrir => "Fenrir",
            Self::Aoede => "Aoede",
        }
    }

    /// Parse from string, with fallback to default.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "zephyr" => Self::Zephyr,
            "puck" => Self::Puck,
            "charon" => Self::Charon,
            "kore" => Self::Kore,
            "fenrir" => Self::Fenrir,
            "aoede" => Self::Aoede,
            _ => Self::default(),
        }
    }
}

impl std::fmt::Display for GeminiVoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Modalities
// =============================================================================

/// Response modalities for the live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modality {
    /// Spoken audio output
    Audio,
    /// Text output
    Text,
}

impl Modality {
    /// Convert to the API parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audio => "AUDIO",
            Self::Text => "TEXT",
        }
    }
}

// =============================================================================
// Live session configuration
// =============================================================================

/// Configuration for one upstream live session.
#[derive(Debug, Clone)]
pub struct LiveConfig {
    /// Gemini API key
    pub api_key: String,

    /// Model identifier, e.g. `gemini-2.5-flash-native-audio-preview-09-2025`
    pub model: String,

    /// Response modalities requested from the model
    pub response_modalities: Vec<Modality>,

    /// Voice used for audio output
    pub voice: GeminiVoice,

    /// System instruction (persona) for the session
    pub system_instruction: Option<String>,

    /// Enable transcription of the caller's input audio
    pub input_transcription: bool,

    /// Bound on session establishment; elapsing surfaces a distinct
    /// timeout error instead of hanging the connection
    pub connect_timeout: Duration,

    /// Endpoint override, used by tests to point at a local server
    pub endpoint: Option<String>,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_LIVE_MODEL.to_string(),
            response_modalities: vec![Modality::Audio, Modality::Text],
            voice: GeminiVoice::default(),
            system_instruction: None,
            input_transcription: true,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            endpoint: None,
        }
    }
}
