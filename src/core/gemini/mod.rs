//! Gemini upstream clients.
//!
//! Two surfaces of the hosted model are used by this gateway:
//!
//! - `live`: the bidirectional WebSocket session behind the audio relay
//! - `text`: the `generateContent` REST API behind the text proxy

pub mod config;
pub mod live;
pub mod messages;
pub mod text;

pub use config::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_LIVE_MODEL, DEFAULT_TEXT_MODEL, GEMINI_API_BASE_URL,
    GEMINI_LIVE_URL, GeminiVoice, LiveConfig, Modality,
};
pub use live::{LiveError, LiveEvent, LiveResult, LiveSessionHandle};
pub use text::{GenerateTextOutcome, TextClient, TextError, TextResult};
