//! PCM audio codec for the live relay.
//!
//! Audio travels the relay protocol as base64-encoded 16-bit signed
//! little-endian PCM. The capture side converts float samples to that wire
//! form; the playback side reverses it into per-channel float planes.
//!
//! # Audio Format
//!
//! - Microphone input: PCM 16-bit, 16kHz, mono, little-endian
//! - Model output: PCM 16-bit, 24kHz, mono, little-endian

use base64::prelude::*;
use bytes::Bytes;
use thiserror::Error;

/// Sample rate of captured microphone audio.
pub const INPUT_SAMPLE_RATE: u32 = 16000;

/// Sample rate of model output audio.
pub const OUTPUT_SAMPLE_RATE: u32 = 24000;

/// Scale factor between float samples in [-1, 1] and 16-bit PCM.
pub const PCM_SCALE: f32 = 32768.0;

/// Errors that can occur while encoding or decoding PCM audio.
#[derive(Debug, Error)]
pub enum AudioError {
    /// The base64 payload could not be decoded
    #[error("Invalid base64 audio payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The PCM byte stream does not divide into whole frames
    #[error("PCM byte length {len} is not a multiple of {alignment} (16-bit x {channels} channel(s))")]
    UnalignedPcm {
        len: usize,
        channels: u16,
        alignment: usize,
    },

    /// A zero channel count was requested
    #[error("Channel count must be non-zero")]
    ZeroChannels,
}

/// Result type for codec operations.
pub type AudioResult<T> = Result<T, AudioError>;

/// Decoded time-domain audio, one sample plane per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl AudioBuffer {
    /// Number of frames (samples per channel).
    pub fn frame_count(&self) -> usize {
        self.channels.first().map(Vec::len).unwrap_or(0)
    }

    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Playback duration in seconds.
    pub fn duration(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// Samples for one channel, normalized to [-1, 1].
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }
}

/// Encode float samples as base64 16-bit little-endian PCM.
///
/// Samples are scaled by [`PCM_SCALE`] and clamped to the i16 range, so
/// out-of-range input saturates instead of wrapping.
pub fn encode_float_pcm(samples: &[f32]) -> String {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let scaled = (sample * PCM_SCALE).clamp(i16::MIN as f32, i16::MAX as f32) as i16;
        bytes.extend_from_slice(&scaled.to_le_bytes());
    }
    BASE64_STANDARD.encode(&bytes)
}

/// Decode a base64 payload back into raw PCM bytes.
pub fn decode_base64_pcm(payload: &str) -> AudioResult<Bytes> {
    Ok(Bytes::from(BASE64_STANDARD.decode(payload)?))
}

/// Reinterpret raw bytes as 16-bit little-endian PCM and de-interleave into
/// an [`AudioBuffer`].
///
/// Input whose length does not divide into whole frames is rejected rather
/// than truncated.
pub fn pcm_to_audio_buffer(bytes: &[u8], sample_rate: u32, channels: u16) -> AudioResult<AudioBuffer> {
    if channels == 0 {
        return Err(AudioError::ZeroChannels);
    }

    let alignment = 2 * channels as usize;
    if bytes.len() % alignment != 0 {
        return Err(AudioError::UnalignedPcm {
            len: bytes.len(),
            channels,
            alignment,
        });
    }

    let frame_count = bytes.len() / alignment;
    let mut planes = vec![Vec::with_capacity(frame_count); channels as usize];

    for (i, frame) in bytes.chunks_exact(2).enumerate() {
        let sample = i16::from_le_bytes([frame[0], frame[1]]);
        planes[i % channels as usize].push(sample as f32 / PCM_SCALE);
    }

    Ok(AudioBuffer {
        channels: planes,
        sample_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_known_samples() {
        let encoded = encode_float_pcm(&[0.0, 0.5, -0.5]);
        let bytes = BASE64_STANDARD.decode(encoded).unwrap();
        assert_eq!(bytes.len(), 6);
        assert_eq!(i16::from_le_bytes([bytes[0], bytes[1]]), 0);
        assert_eq!(i16::from_le_bytes([bytes[2], bytes[3]]), 16384);
        assert_eq!(i16::from_le_bytes([bytes[4], bytes[5]]), -16384);
    }

    #[test]
    fn test_encode_clamps_out_of_range() {
        let encoded = encode_float_pcm(&[1.5, -1.5]);
        let bytes = BASE64_STANDARD.decode(encoded).unwrap();
        assert_eq!(i16::from_le_bytes([bytes[0], bytes[1]]), i16::MAX);
        assert_eq!(i16::from_le_bytes([bytes[2], bytes[3]]), i16::MIN);
    }

    #[test]
    fn test_base64_round_trip_is_lossless() {
        let samples: Vec<f32> = (0..256).map(|i| (i as f32 / 256.0) - 0.5).collect();
        let encoded = encode_float_pcm(&samples);
        let decoded = decode_base64_pcm(&encoded).unwrap();

        let mut expected = Vec::with_capacity(samples.len() * 2);
        for &s in &samples {
            expected
                .extend_from_slice(&((s * PCM_SCALE).clamp(i16::MIN as f32, i16::MAX as f32) as i16).to_le_bytes());
        }
        assert_eq!(decoded.as_ref(), expected.as_slice());
    }

    #[test]
    fn test_decode_rejects_invalid_base64() {
        assert!(matches!(
            decode_base64_pcm("not-base64!!"),
            Err(AudioError::Base64(_))
        ));
    }

    #[test]
    fn test_buffer_rejects_unaligned_input() {
        let err = pcm_to_audio_buffer(&[0, 1, 2], 24000, 1).unwrap_err();
        assert!(matches!(err, AudioError::UnalignedPcm { len: 3, .. }));

        // Six bytes is three mono frames but only one and a half stereo frames.
        let bytes = [0u8, 0, 0, 0, 0, 0];
        assert!(pcm_to_audio_buffer(&bytes, 24000, 1).is_ok());
        let err = pcm_to_audio_buffer(&bytes, 24000, 2).unwrap_err();
        assert!(matches!(err, AudioError::UnalignedPcm { .. }));
    }

    #[test]
    fn test_buffer_rejects_zero_channels() {
        assert!(matches!(
            pcm_to_audio_buffer(&[], 24000, 0),
            Err(AudioError::ZeroChannels)
        ));
    }

    #[test]
    fn test_buffer_normalizes_and_deinterleaves() {
        // Two stereo frames: (16384, -16384), (0, 32767)
        let mut bytes = Vec::new();
        for v in [16384i16, -16384, 0, 32767] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }

        let buffer = pcm_to_audio_buffer(&bytes, 24000, 2).unwrap();
        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.frame_count(), 2);
        assert_eq!(buffer.channel(0).unwrap(), &[0.5, 0.0]);
        assert_eq!(buffer.channel(1).unwrap()[0], -0.5);
    }

    #[test]
    fn test_buffer_duration() {
        let bytes = vec![0u8; 24000 * 2];
        let buffer = pcm_to_audio_buffer(&bytes, 24000, 1).unwrap();
        assert!((buffer.duration() - 1.0).abs() < f64::EPSILON);
    }
}
