//! Assistant session: the composition root for the client side.
//!
//! Ties one capture source, one relay transport, one transcript assembler
//! and one playback scheduler together for the lifetime of an assistant
//! panel. Stopping releases everything exactly once and is safe to call
//! repeatedly; the transcript survives the stop so the UI can keep
//! rendering it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use super::capture::{CaptureError, SampleSource, run_capture};
use super::events::LiveServerPayload;
use super::playback::{AudioClock, PlaybackScheduler, PlaybackSink};
use super::transcript::{TranscriptAssembler, TranscriptTurn};
use super::transport::{RelayEndpoints, RelayEvent, RelayTransport, TransportError};

/// Channel capacity for UI events.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Errors starting an assistant session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The relay could not be reached
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The microphone could not be acquired
    #[error(transparent)]
    Capture(#[from] CaptureError),
}

/// Events the UI renders.
#[derive(Debug)]
pub enum SessionEvent {
    /// The relay's upstream session is established
    Ready,
    /// The transcript or interim text changed
    TranscriptUpdated,
    /// A dismissable error for the user; the session does not retry itself
    Error(String),
    /// Terminal: control affordances should reset to "start recording"
    Closed,
}

/// One live assistant conversation.
pub struct AssistantSession {
    transport: Arc<RelayTransport>,
    transcript: Arc<Mutex<TranscriptAssembler>>,
    capture_task: Mutex<Option<JoinHandle<()>>>,
    stopped: AtomicBool,
}

impl AssistantSession {
    /// Connect to the relay and start streaming the capture source.
    ///
    /// Fails fast when the relay is unreachable; capture device errors
    /// surface through the event stream and end the session without retry.
    pub async fn start<S, C, K>(
        endpoints: RelayEndpoints,
        source: S,
        clock: C,
        sink: K,
    ) -> Result<(Arc<Self>, mpsc::Receiver<SessionEvent>), SessionError>
    where
        S: SampleSource + 'static,
        C: AudioClock + Send + 'static,
        K: PlaybackSink + Send + 'static,
    {
        let (transport, mut relay_events) = RelayTransport::new(endpoints);
        transport.connect().await?;
        let transport = Arc::new(transport);

        let (ui_tx, ui_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let transcript = Arc::new(Mutex::new(TranscriptAssembler::new()));

        // Event pump: relayed payloads feed the transcript and the playback
        // scheduler; terminal events end the pump.
        let pump_transcript = transcript.clone();
        let pump_tx = ui_tx.clone();
        tokio::spawn(async move {
            let mut scheduler = PlaybackScheduler::new(clock, sink);
            while let Some(event) = relay_events.recv().await {
                match event {
                    RelayEvent::Connected => {
                        let _ = pump_tx.send(SessionEvent::Ready).await;
                    }
                    RelayEvent::Payload(value) => {
                        let payload = LiveServerPayload::parse(&value);
                        if let Some(content) = payload.server_content {
                            pump_transcript.lock().apply(&content);
                            if let Err(e) = scheduler.handle(&content) {
                                warn!("Dropping undecodable model audio: {}", e);
                            }
                            let _ = pump_tx.send(SessionEvent::TranscriptUpdated).await;
                        }
                    }
                    RelayEvent::Error(message) => {
                        let _ = pump_tx.send(SessionEvent::Error(message)).await;
                    }
                    RelayEvent::SessionClosed => {
                        let _ = pump_tx.send(SessionEvent::Closed).await;
                        break;
                    }
                }
            }
        });

        // Capture pump: microphone blocks into the transport.
        let capture_transport = transport.clone();
        let capture_tx = ui_tx;
        let capture_task = tokio::spawn(async move {
            if let Err(e) = run_capture(source, capture_transport).await {
                let _ = capture_tx.send(SessionEvent::Error(e.to_string())).await;
            }
        });

        let session = Arc::new(Self {
            transport,
            transcript,
            capture_task: Mutex::new(Some(capture_task)),
            stopped: AtomicBool::new(false),
        });

        Ok((session, ui_rx))
    }

    /// Stop the session, releasing the capture source, the transport and
    /// the playback scheduler. Safe to call more than once.
    pub async fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }

        self.transport.stop().await;

        // The capture source may be blocked waiting on a device callback.
        let capture_task = self.capture_task.lock().take();
        if let Some(task) = capture_task {
            task.abort();
        }
    }

    /// Whether audio is still being recorded.
    pub fn is_recording(&self) -> bool {
        self.transport.is_recording()
    }

    /// Snapshot of the completed turns.
    pub fn transcript(&self) -> Vec<TranscriptTurn> {
        self.transcript.lock().turns().to_vec()
    }

    /// The in-progress utterance.
    pub fn interim(&self) -> String {
        self.transcript.lock().interim().to_string()
    }
}
