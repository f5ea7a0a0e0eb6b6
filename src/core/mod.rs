pub mod audio;
pub mod gemini;

// Re-export commonly used types for convenience
pub use audio::{AudioBuffer, AudioChunk, AudioError, PCM_MIME_TYPE, PendingQueue};
pub use gemini::{
    GeminiVoice, LiveConfig, LiveError, LiveEvent, LiveSessionHandle, Modality, TextClient,
    TextError,
};
