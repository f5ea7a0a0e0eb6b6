//! Wire messages for the Gemini Live WebSocket protocol.
//!
//! Only the client-to-server frames are typed. Everything the upstream
//! session sends back is relayed to our client verbatim as raw JSON, so no
//! server event schema is modelled here.

use serde::Serialize;

use super::config::{LiveConfig, Modality};
use crate::core::audio::AudioChunk;

/// First frame on the live socket: session setup.
#[derive(Debug, Clone, Serialize)]
pub struct SetupMessage {
    pub setup: Setup,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Setup {
    pub model: String,
    pub generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_transcription: Option<InputAudioTranscription>,
}

/// Empty marker object; its presence enables input transcription.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InputAudioTranscription {}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<Modality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_config: Option<SpeechConfig>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    pub voice_config: VoiceConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Part {
    pub text: String,
}

impl SetupMessage {
    /// Build the setup frame for a session configuration.
    pub fn from_config(config: &LiveConfig) -> Self {
        Self {
            setup: Setup {
                model: format!("models/{}", config.model),
                generation_config: GenerationConfig {
                    response_modalities: config.response_modalities.clone(),
                    speech_config: Some(SpeechConfig {
                        voice_config: VoiceConfig {
                            prebuilt_voice_config: PrebuiltVoiceConfig {
                                voice_name: config.voice.as_str().to_string(),
                            },
                        },
                    }),
                },
                system_instruction: config.system_instruction.as_ref().map(|text| Content {
                    parts: vec![Part { text: text.clone() }],
                }),
                input_audio_transcription: config
                    .input_transcription
                    .then(InputAudioTranscription::default),
            },
        }
    }
}

/// Streaming audio input frame.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeInputMessage {
    pub realtime_input: RealtimeInput,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeInput {
    pub media_chunks: Vec<MediaChunk>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaChunk {
    pub mime_type: String,
    pub data: String,
}

impl RealtimeInputMessage {
    /// Wrap one audio chunk for transmission upstream.
    pub fn from_chunk(chunk: &AudioChunk) -> Self {
        Self {
            realtime_input: RealtimeInput {
                media_chunks: vec![MediaChunk {
                    mime_type: chunk.mime_type.clone(),
                    data: chunk.data.clone(),
                }],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gemini::config::GeminiVoice;

    #[test]
    fn test_setup_message_shape() {
        let config = LiveConfig {
            model: "gemini-2.5-flash-native-audio-preview-09-2025".to_string(),
            voice: GeminiVoice::Zephyr,
            system_instruction: Some("Be helpful.".to_string()),
            ..Default::default()
        };

        let json = serde_json::to_value(SetupMessage::from_config(&config)).unwrap();
        assert_eq!(
            json["setup"]["model"],
            "models/gemini-2.5-flash-native-audio-preview-09-2025"
        );
        assert_eq!(
            json["setup"]["generationConfig"]["responseModalities"],
            serde_json::json!(["AUDIO", "TEXT"])
        );
        assert_eq!(
            json["setup"]["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]
                ["voiceName"],
            "Zephyr"
        );
        assert_eq!(
            json["setup"]["systemInstruction"]["parts"][0]["text"],
            "Be helpful."
        );
        assert_eq!(
            json["setup"]["inputAudioTranscription"],
            serde_json::json!({})
        );
    }

    #[test]
    fn test_setup_omits_disabled_transcription() {
        let config = LiveConfig {
            input_transcription: false,
            system_instruction: None,
            ..Default::default()
        };

        let json = serde_json::to_value(SetupMessage::from_config(&config)).unwrap();
        assert!(json["setup"].get("inputAudioTranscription").is_none());
        assert!(json["setup"].get("systemInstruction").is_none());
    }

    #[test]
    fn test_realtime_input_shape() {
        let chunk = AudioChunk::new("QUJD".to_string(), None);
        let json = serde_json::to_value(RealtimeInputMessage::from_chunk(&chunk)).unwrap();
        assert_eq!(
            json["realtimeInput"]["mediaChunks"][0]["mimeType"],
            "audio/pcm;rate=16000"
        );
        assert_eq!(json["realtimeInput"]["mediaChunks"][0]["data"], "QUJD");
    }
}
