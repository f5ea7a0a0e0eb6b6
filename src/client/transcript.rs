//! Transcript reconstruction from relayed model events.
//!
//! The assembler trusts the relay's message order as the source of ordering
//! truth: a user turn is always finalized before any later model text is
//! attributed to it. That assumption holds within one WebSocket connection
//! only, so a reconnect must call [`TranscriptAssembler::reset`] to begin a
//! new transcript context.

use serde::Serialize;

use super::events::ServerContent;

/// Label used when model text arrives before any user turn exists.
pub const ASSISTANT_LABEL: &str = "Gemini AI Assistant";

/// One user utterance paired with the model's response text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TranscriptTurn {
    pub user: String,
    pub model: String,
}

/// Accumulates interim transcription and completed turns.
#[derive(Debug, Default)]
pub struct TranscriptAssembler {
    turns: Vec<TranscriptTurn>,
    interim: String,
}

impl TranscriptAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed turns, oldest first. The last turn keeps accumulating
    /// model text until the next one begins.
    pub fn turns(&self) -> &[TranscriptTurn] {
        &self.turns
    }

    /// The in-progress utterance, not yet finalized.
    pub fn interim(&self) -> &str {
        &self.interim
    }

    /// Begin a new transcript context (new connection).
    pub fn reset(&mut self) {
        self.turns.clear();
        self.interim.clear();
    }

    /// Apply one relayed server content event.
    pub fn apply(&mut self, content: &ServerContent) {
        if let Some(input) = &content.input_transcription {
            // Each message carries the latest cumulative interim text;
            // replace, never append.
            if let Some(text) = &input.text {
                self.interim = text.clone();
            }
            if input.finished.unwrap_or(false) {
                self.finalize_interim();
            }
        }

        // Some streams signal completion on the envelope instead of the
        // transcription object.
        if content.turn_complete.unwrap_or(false) {
            self.finalize_interim();
        }

        if let Some(text) = model_text(content) {
            self.append_model_text(&text);
        }
    }

    /// Finalize the current utterance into a new turn. An empty interim
    /// never creates a blank turn.
    fn finalize_interim(&mut self) {
        let text = self.interim.trim();
        if !text.is_empty() {
            self.turns.push(TranscriptTurn {
                user: text.to_string(),
                model: String::new(),
            });
        }
        self.interim.clear();
    }

    /// Append model text to the latest turn, creating a placeholder turn
    /// when none exists yet.
    fn append_model_text(&mut self, text: &str) {
        if self.turns.is_empty() {
            self.turns.push(TranscriptTurn {
                user: ASSISTANT_LABEL.to_string(),
                model: String::new(),
            });
        }
        // turns is non-empty here
        if let Some(last) = self.turns.last_mut() {
            if !last.model.is_empty() {
                last.model.push('\n');
            }
            last.model.push_str(text);
        }
    }
}

/// Model-side text for an event: the output transcription if present,
/// otherwise the non-empty text parts of the model turn, newline-joined.
fn model_text(content: &ServerContent) -> Option<String> {
    if let Some(output) = &content.output_transcription
        && let Some(text) = &output.text
        && !text.is_empty()
    {
        return Some(text.clone());
    }

    let parts: Vec<&str> = content
        .model_turn
        .as_ref()?
        .parts
        .iter()
        .filter_map(|p| p.text.as_deref())
        .filter(|t| !t.is_empty())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::events::{ContentPart, ModelTurn, Transcription};

    fn input(text: &str, finished: Option<bool>) -> ServerContent {
        ServerContent {
            input_transcription: Some(Transcription {
                text: Some(text.to_string()),
                finished,
            }),
            ..Default::default()
        }
    }

    fn model_parts(texts: &[&str]) -> ServerContent {
        ServerContent {
            model_turn: Some(ModelTurn {
                parts: texts
                    .iter()
                    .map(|t| ContentPart {
                        text: Some(t.to_string()),
                        inline_data: None,
                    })
                    .collect(),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_interim_replaces_rather_than_appends() {
        let mut assembler = TranscriptAssembler::new();
        assembler.apply(&input("he", None));
        assembler.apply(&input("hello", None));
        assert_eq!(assembler.interim(), "hello");
        assert!(assembler.turns().is_empty());
    }

    #[test]
    fn test_finished_transcription_finalizes_turn() {
        // The canonical event sequence: two interim updates, the second
        // marked finished, followed by the model reply.
        let mut assembler = TranscriptAssembler::new();
        assembler.apply(&input("he", None));
        assembler.apply(&input("hello", Some(true)));
        assembler.apply(&model_parts(&["Hi!"]));

        assert_eq!(
            assembler.turns(),
            &[TranscriptTurn {
                user: "hello".to_string(),
                model: "Hi!".to_string(),
            }]
        );
        assert_eq!(assembler.interim(), "");
    }

    #[test]
    fn test_turn_complete_finalizes_from_interim() {
        let mut assembler = TranscriptAssembler::new();
        assembler.apply(&input("what is revenue", None));
        assembler.apply(&ServerContent {
            turn_complete: Some(true),
            ..Default::default()
        });

        assert_eq!(assembler.turns().len(), 1);
        assert_eq!(assembler.turns()[0].user, "what is revenue");
        assert_eq!(assembler.interim(), "");
    }

    #[test]
    fn test_turn_complete_with_empty_interim_creates_no_turn() {
        let mut assembler = TranscriptAssembler::new();
        assembler.apply(&ServerContent {
            turn_complete: Some(true),
            ..Default::default()
        });
        assert!(assembler.turns().is_empty());

        // Whitespace-only interim is also ignored.
        assembler.apply(&input("   ", Some(true)));
        assert!(assembler.turns().is_empty());
        assert_eq!(assembler.interim(), "");
    }

    #[test]
    fn test_model_text_without_user_turn_gets_placeholder() {
        let mut assembler = TranscriptAssembler::new();
        assembler.apply(&model_parts(&["Welcome back."]));

        assert_eq!(assembler.turns().len(), 1);
        assert_eq!(assembler.turns()[0].user, ASSISTANT_LABEL);
        assert_eq!(assembler.turns()[0].model, "Welcome back.");
    }

    #[test]
    fn test_model_text_accumulates_with_newlines() {
        let mut assembler = TranscriptAssembler::new();
        assembler.apply(&input("hi", Some(true)));
        assembler.apply(&model_parts(&["First."]));
        assembler.apply(&model_parts(&["Second.", "Third."]));

        assert_eq!(assembler.turns()[0].model, "First.\nSecond.\nThird.");
    }

    #[test]
    fn test_output_transcription_preferred_over_parts() {
        let mut assembler = TranscriptAssembler::new();
        let mut content = model_parts(&["part text"]);
        content.output_transcription = Some(Transcription {
            text: Some("spoken text".to_string()),
            finished: None,
        });
        assembler.apply(&content);

        assert_eq!(assembler.turns()[0].model, "spoken text");
    }

    #[test]
    fn test_finalization_orders_before_model_append() {
        // A single event carrying both a finished transcription and model
        // text must attribute the model text to the newly finalized turn.
        let mut assembler = TranscriptAssembler::new();
        let mut content = input("question", Some(true));
        content.model_turn = Some(ModelTurn {
            parts: vec![ContentPart {
                text: Some("answer".to_string()),
                inline_data: None,
            }],
        });
        assembler.apply(&content);

        assert_eq!(
            assembler.turns(),
            &[TranscriptTurn {
                user: "question".to_string(),
                model: "answer".to_string(),
            }]
        );
    }

    #[test]
    fn test_reset_clears_context() {
        let mut assembler = TranscriptAssembler::new();
        assembler.apply(&input("hello", Some(true)));
        assembler.apply(&input("more", None));
        assembler.reset();

        assert!(assembler.turns().is_empty());
        assert_eq!(assembler.interim(), "");
    }
}
