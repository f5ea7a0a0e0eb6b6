//! Audio chunk and pending-queue types.
//!
//! An [`AudioChunk`] is the unit of transport in both directions of the
//! relay: base64 PCM plus its mime type. A [`PendingQueue`] holds chunks
//! produced before the next hop is ready; both the client transport and the
//! server relay own exactly one per connection.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::codec;

/// Mime type of captured microphone audio.
pub const PCM_MIME_TYPE: &str = "audio/pcm;rate=16000";

/// One chunk of base64-encoded 16-bit PCM audio. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioChunk {
    /// Base64 payload of 16-bit little-endian PCM samples
    pub data: String,
    /// Mime type, e.g. `audio/pcm;rate=16000`
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

impl AudioChunk {
    /// Create a chunk from raw base64 data, defaulting the mime type.
    pub fn new(data: String, mime_type: Option<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.unwrap_or_else(|| PCM_MIME_TYPE.to_string()),
        }
    }

    /// Encode a block of float samples into a chunk.
    pub fn from_samples(samples: &[f32]) -> Self {
        Self {
            data: codec::encode_float_pcm(samples),
            mime_type: PCM_MIME_TYPE.to_string(),
        }
    }
}

/// FIFO queue of chunks awaiting a ready transport.
///
/// One instance per connection, constructed and destroyed with the
/// connection. Chunks are drained in push order, never reordered.
#[derive(Debug, Default)]
pub struct PendingQueue {
    chunks: VecDeque<AudioChunk>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk to the back of the queue.
    pub fn push(&mut self, chunk: AudioChunk) {
        self.chunks.push_back(chunk);
    }

    /// Remove and return all queued chunks in FIFO order.
    pub fn drain(&mut self) -> Vec<AudioChunk> {
        self.chunks.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}
