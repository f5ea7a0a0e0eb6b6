//! Client-side components of the live assistant.
//!
//! These are the pieces a native front end embeds: capture framing, the
//! relay transport with its pending queue, transcript reconstruction,
//! playback scheduling, and the session object that composes them.
//! Device I/O stays behind the [`capture::SampleSource`] and
//! [`playback::PlaybackSink`] traits.

pub mod capture;
pub mod events;
pub mod playback;
pub mod session;
pub mod transcript;
pub mod transport;

pub use capture::{CAPTURE_BLOCK_SIZE, CaptureError, CaptureFramer, ChannelSource, SampleSource};
pub use events::{ContentPart, InlineData, LiveServerPayload, ModelTurn, ServerContent, Transcription};
pub use playback::{AudioClock, PlaybackScheduler, PlaybackSink};
pub use session::{AssistantSession, SessionError, SessionEvent};
pub use transcript::{ASSISTANT_LABEL, TranscriptAssembler, TranscriptTurn};
pub use transport::{
    RELAY_WS_PATH, RelayEndpoints, RelayEvent, RelayTransport, TransportError, TransportState,
};
