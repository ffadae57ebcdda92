//! Turns response choices into typed payloads.
//!
//! Every choice is decoded on its own; a malformed payload in one choice is
//! reported as [`Outcome::DecodeFailed`] and the remaining choices are still
//! processed.

use crate::ai::openai::{ChatResponseEnvelope, Choice};
use crate::codec::{DecodeError, SchemaCodec};
use crate::models::ReasoningResult;
use crate::schema::StructuredOutput;

/// Result of decoding a single choice.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The choice carried no content, e.g. a refusal.
    NoContent { refusal: Option<String> },
    Decoded(T),
    DecodeFailed { error: DecodeError, raw: String },
}

impl<T> Outcome<T> {
    pub fn decoded(&self) -> Option<&T> {
        match self {
            Outcome::Decoded(value) => Some(value),
            _ => None,
        }
    }
}

/// Result of processing a whole envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction<T> {
    /// The envelope was well formed but held no choices.
    NoChoices,
    /// One outcome per choice, in response order.
    Choices(Vec<Outcome<T>>),
}

#[derive(Debug)]
pub struct ReasoningExtractor<T = ReasoningResult> {
    codec: SchemaCodec<T>,
}

impl<T: StructuredOutput> ReasoningExtractor<T> {
    pub fn new(codec: SchemaCodec<T>) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &SchemaCodec<T> {
        &self.codec
    }

    pub fn extract(&self, choice: &Choice) -> Outcome<T> {
        let Some(content) = choice.message.content.as_deref() else {
            return Outcome::NoContent {
                refusal: choice.message.refusal.clone(),
            };
        };

        match self.codec.decode_str(content) {
            Ok(value) => Outcome::Decoded(value),
            Err(error) => Outcome::DecodeFailed {
                error,
                raw: content.to_string(),
            },
        }
    }

    pub fn extract_all(&self, envelope: &ChatResponseEnvelope) -> Extraction<T> {
        if envelope.choices.is_empty() {
            tracing::debug!("Response contained no choices");
            return Extraction::NoChoices;
        }

        let outcomes = envelope
            .choices
            .iter()
            .enumerate()
            .map(|(index, choice)| {
                if let Some(reason) = &choice.finish_reason {
                    tracing::debug!("Choice {} finished with reason '{}'", index, reason);
                }

                let outcome = self.extract(choice);
                match &outcome {
                    Outcome::NoContent { .. } => {
                        tracing::debug!("Choice {} has no content, skipping", index)
                    }
                    Outcome::DecodeFailed { error, .. } => {
                        tracing::debug!("Choice {} failed to decode: {}", index, error)
                    }
                    Outcome::Decoded(_) => tracing::debug!("Choice {} decoded", index),
                }
                outcome
            })
            .collect();

        Extraction::Choices(outcomes)
    }
}
