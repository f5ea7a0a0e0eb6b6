//! Audio primitives shared by the capture, relay and playback paths.

pub mod chunk;
pub mod codec;

pub use chunk::{AudioChunk, PCM_MIME_TYPE, PendingQueue};
pub use codec::{
    AudioBuffer, AudioError, AudioResult, INPUT_SAMPLE_RATE, OUTPUT_SAMPLE_RATE, PCM_SCALE,
    decode_base64_pcm, encode_float_pcm, pcm_to_audio_buffer,
};
