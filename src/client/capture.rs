//! Microphone capture framing.
//!
//! Device acquisition is platform territory and lives behind the
//! [`SampleSource`] trait; this module owns what happens after samples
//! exist: framing the continuous stream into fixed-size mono blocks,
//! encoding each block, and feeding the resulting chunks to the transport.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

use crate::core::audio::AudioChunk;

use super::transport::RelayTransport;

/// Samples per encoded block.
pub const CAPTURE_BLOCK_SIZE: usize = 4096;

/// Errors from the capture path.
///
/// Device errors are fatal to starting a session: they are surfaced to the
/// user and never retried automatically.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The microphone could not be acquired
    #[error("Failed to start microphone: {0}")]
    DeviceUnavailable(String),

    /// The capture stream failed mid-session
    #[error("Capture source failed: {0}")]
    Source(String),
}

/// A stream of float PCM sample blocks from some capture device.
///
/// `next_block` returns `None` when the stream ends normally.
#[async_trait]
pub trait SampleSource: Send {
    async fn next_block(&mut self) -> Result<Option<Vec<f32>>, CaptureError>;
}

/// A [`SampleSource`] fed through a channel, for embedders that own their
/// audio callback (and for tests).
pub struct ChannelSource {
    rx: mpsc::Receiver<Vec<f32>>,
}

impl ChannelSource {
    pub fn new(rx: mpsc::Receiver<Vec<f32>>) -> Self {
        Self { rx }
    }
}

#[async_trait]
impl SampleSource for ChannelSource {
    async fn next_block(&mut self) -> Result<Option<Vec<f32>>, CaptureError> {
        Ok(self.rx.recv().await)
    }
}

/// Frames arbitrary-size sample input into fixed-size encoded chunks.
///
/// A partial tail is held until enough samples arrive to fill a block;
/// ending the stream discards it, matching a processing node that only
/// ever fires on full buffers.
#[derive(Debug)]
pub struct CaptureFramer {
    block_size: usize,
    buffer: Vec<f32>,
}

impl CaptureFramer {
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size,
            buffer: Vec::with_capacity(block_size),
        }
    }

    /// Feed samples in; get zero or more complete chunks out.
    pub fn push(&mut self, samples: &[f32]) -> Vec<AudioChunk> {
        self.buffer.extend_from_slice(samples);

        let mut chunks = Vec::new();
        while self.buffer.len() >= self.block_size {
            let block: Vec<f32> = self.buffer.drain(..self.block_size).collect();
            chunks.push(AudioChunk::from_samples(&block));
        }
        chunks
    }

    /// Samples currently buffered below one block.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

/// Pump a capture source into the relay transport until the source ends or
/// the transport closes.
pub async fn run_capture<S: SampleSource>(
    mut source: S,
    transport: Arc<RelayTransport>,
) -> Result<(), CaptureError> {
    let mut framer = CaptureFramer::new(CAPTURE_BLOCK_SIZE);

    while let Some(samples) = source.next_block().await? {
        for chunk in framer.push(&samples) {
            if transport.send_chunk(chunk).await.is_err() {
                debug!("Transport closed, ending capture");
                return Ok(());
            }
        }
    }

    debug!("Capture source ended");
    Ok(())
}
