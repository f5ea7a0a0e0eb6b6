//! Gapless playback scheduling for relayed model audio.
//!
//! Model audio arrives as discrete chunks at irregular intervals. The
//! scheduler keeps a single "next start" cursor: each decoded buffer is
//! scheduled to start exactly where the previous one ends (or now, if the
//! stream fell behind the audio clock), so buffers never overlap and never
//! play out of arrival order.

use crate::core::audio::{AudioBuffer, AudioResult, OUTPUT_SAMPLE_RATE, codec};

use super::events::ServerContent;

/// Channel count of model output audio.
pub const PLAYBACK_CHANNELS: u16 = 1;

/// Source of the current audio clock time, in seconds.
pub trait AudioClock {
    fn now(&self) -> f64;
}

/// Output device abstraction: plays a buffer at an absolute clock time.
pub trait PlaybackSink {
    fn play(&mut self, buffer: AudioBuffer, start: f64);
}

/// Schedules decoded audio buffers for sequential, gapless playback.
pub struct PlaybackScheduler<C, S> {
    clock: C,
    sink: S,
    next_start: f64,
}

impl<C: AudioClock, S: PlaybackSink> PlaybackScheduler<C, S> {
    pub fn new(clock: C, sink: S) -> Self {
        Self {
            clock,
            sink,
            next_start: 0.0,
        }
    }

    /// The cursor: absolute time the next buffer will start at.
    pub fn next_start(&self) -> f64 {
        self.next_start
    }

    /// Rewind the cursor for a new session.
    pub fn reset(&mut self) {
        self.next_start = 0.0;
    }

    /// Decode and schedule the inline audio in a server content event, if
    /// any. Returns whether audio was scheduled.
    pub fn handle(&mut self, content: &ServerContent) -> AudioResult<bool> {
        let Some(inline) = content
            .model_turn
            .as_ref()
            .into_iter()
            .flat_map(|turn| turn.parts.iter())
            .filter_map(|part| part.inline_data.as_ref())
            .find(|data| data.is_audio())
        else {
            return Ok(false);
        };

        let bytes = codec::decode_base64_pcm(&inline.data)?;
        let buffer = codec::pcm_to_audio_buffer(&bytes, OUTPUT_SAMPLE_RATE, PLAYBACK_CHANNELS)?;

        self.next_start = self.next_start.max(self.clock.now());
        let start = self.next_start;
        let duration = buffer.duration();
        self.sink.play(buffer, start);
        self.next_start = start + duration;

        Ok(true)
    }
}
