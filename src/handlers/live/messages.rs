//! Live relay WebSocket message types.
//!
//! The relay protocol is a small set of JSON envelopes discriminated by
//! `type`. Clients stream base64 PCM audio up and receive status, error and
//! pass-through model events back. Both directions are defined here; the
//! client transport reuses these types to parse what the server sends.

use serde::{Deserialize, Serialize};

use crate::core::audio::AudioChunk;

// =============================================================================
// Incoming Envelopes (Client -> Server)
// =============================================================================

/// Incoming WebSocket envelopes from the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientEnvelope {
    /// One chunk of microphone audio
    Audio {
        /// Base64 16-bit PCM payload
        data: String,
        /// Mime type; defaults to `audio/pcm;rate=16000` when absent
        #[serde(rename = "mimeType", default, skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
    },

    /// Session control
    Control {
        /// Requested action
        action: ControlAction,
    },
}

/// Control actions a client may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlAction {
    /// End the session: close the upstream session, then the socket
    Stop,
}

impl ClientEnvelope {
    /// Wrap an audio chunk for transmission.
    pub fn audio(chunk: AudioChunk) -> Self {
        Self::Audio {
            data: chunk.data,
            mime_type: Some(chunk.mime_type),
        }
    }

    /// The stop control envelope.
    pub fn stop() -> Self {
        Self::Control {
            action: ControlAction::Stop,
        }
    }
}

// =============================================================================
// Outgoing Envelopes (Server -> Client)
// =============================================================================

/// Outgoing WebSocket envelopes to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerEnvelope {
    /// Relay lifecycle notification
    Status {
        /// New relay status
        status: RelayStatus,
    },

    /// Terminal or per-message error
    Error {
        /// Human-readable description
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// One upstream model event, relayed verbatim
    Gemini {
        /// Opaque upstream payload
        payload: serde_json::Value,
    },
}

/// Relay lifecycle states reported to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayStatus {
    /// The upstream session is established and accepting audio
    Connected,
    /// The upstream session has closed
    Closed,
}

/// Routing wrapper for the client socket sender task.
#[derive(Debug)]
pub enum MessageRoute {
    /// Serialize and send an envelope
    Outgoing(ServerEnvelope),
    /// Close the socket and stop the sender task
    Close,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_envelope_wire_shape() {
        let envelope = ClientEnvelope::audio(AudioChunk::new("QUJD".to_string(), None));
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "audio",
                "data": "QUJD",
                "mimeType": "audio/pcm;rate=16000",
            })
        );
    }

    #[test]
    fn test_audio_envelope_mime_type_optional() {
        let parsed: ClientEnvelope =
            serde_json::from_str(r#"{"type":"audio","data":"QUJD"}"#).unwrap();
        assert_eq!(
            parsed,
            ClientEnvelope::Audio {
                data: "QUJD".to_string(),
                mime_type: None,
            }
        );
    }

    #[test]
    fn test_control_stop_wire_shape() {
        let json = serde_json::to_value(ClientEnvelope::stop()).unwrap();
        assert_eq!(json, serde_json::json!({"type": "control", "action": "stop"}));
    }

    #[test]
    fn test_status_envelope_wire_shape() {
        let json = serde_json::to_value(ServerEnvelope::Status {
            status: RelayStatus::Connected,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"type": "status", "status": "connected"}));

        let parsed: ServerEnvelope =
            serde_json::from_str(r#"{"type":"status","status":"closed"}"#).unwrap();
        assert_eq!(
            parsed,
            ServerEnvelope::Status {
                status: RelayStatus::Closed
            }
        );
    }

    #[test]
    fn test_error_envelope_message_optional() {
        let parsed: ServerEnvelope = serde_json::from_str(r#"{"type":"error"}"#).unwrap();
        assert_eq!(parsed, ServerEnvelope::Error { message: None });

        let json = serde_json::to_value(ServerEnvelope::Error { message: None }).unwrap();
        assert_eq!(json, serde_json::json!({"type": "error"}));
    }

    #[test]
    fn test_gemini_envelope_passes_payload_through() {
        let payload = serde_json::json!({"serverContent": {"turnComplete": true}});
        let envelope = ServerEnvelope::Gemini {
            payload: payload.clone(),
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["type"], "gemini");
        assert_eq!(json["payload"], payload);
    }

    #[test]
    fn test_unknown_envelope_type_rejected() {
        assert!(serde_json::from_str::<ClientEnvelope>(r#"{"type":"video","data":""}"#).is_err());
    }
}
