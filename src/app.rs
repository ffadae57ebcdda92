//! Application orchestration: one prompt in, one report out.

use crate::ai::openai::{ChatClient, ChatRequest, Message, ResponseFormatSpec};
use crate::ai::{ReqwestTransport, Transport};
use crate::codec::SchemaCodec;
use crate::extract::{Extraction, Outcome, ReasoningExtractor};
use crate::models::{Config, ReasoningResult};
use crate::{prompts, Result};
use std::io::{self, Write};
use tracing::info;

/// Coordinates request building, the chat call and payload extraction.
#[derive(Debug)]
pub struct App {
    chat: ChatClient,
    model: String,
    response_format: ResponseFormatSpec,
    extractor: ReasoningExtractor<ReasoningResult>,
}

impl App {
    /// Construct an app backed by the `reqwest` transport.
    pub fn new(config: &Config) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout)?;
        Self::with_transport(config, Box::new(transport))
    }

    /// Build an app around any transport.
    ///
    /// The payload schema is derived here, so an unrepresentable payload type
    /// fails before any request is sent.
    pub fn with_transport(config: &Config, transport: Box<dyn Transport>) -> Result<Self> {
        let codec = SchemaCodec::<ReasoningResult>::new()?;

        let mut response_format =
            ResponseFormatSpec::json_schema(codec.schema_name(), codec.schema().clone());
        if config.strict {
            response_format = response_format.with_strict(true);
        }

        let chat = ChatClient::new(transport, config.api_key.clone())
            .with_base_url(config.base_url.clone())
            .with_debug(config.debug);

        info!("Chat model: {} (endpoint: {})", config.model, chat.endpoint());

        Ok(Self {
            chat,
            model: config.model.clone(),
            response_format,
            extractor: ReasoningExtractor::new(codec),
        })
    }

    pub fn build_request(&self, prompt: &str) -> ChatRequest {
        ChatRequest::new(
            self.model.clone(),
            vec![
                Message::system(prompts::math_system()),
                Message::user(prompt),
            ],
            self.response_format.clone(),
        )
    }

    pub async fn run(&self, prompt: &str) -> Result<Extraction<ReasoningResult>> {
        let request = self.build_request(prompt);
        let envelope = self.chat.send(&request).await?;
        info!("Received {} choice(s)", envelope.choices.len());
        Ok(self.extractor.extract_all(&envelope))
    }
}

/// Write decoded steps to `out` and diagnostics to `err`.
pub fn render_report<O: Write, E: Write>(
    extraction: &Extraction<ReasoningResult>,
    out: &mut O,
    err: &mut E,
) -> io::Result<()> {
    let outcomes = match extraction {
        Extraction::NoChoices => {
            writeln!(err, "No choices returned by the model")?;
            return Ok(());
        }
        Extraction::Choices(outcomes) => outcomes,
    };

    for (index, outcome) in outcomes.iter().enumerate() {
        match outcome {
            Outcome::Decoded(result) => {
                for (step_index, step) in result.steps.iter().enumerate() {
                    writeln!(out, "Step {}: {}", step_index + 1, step.explanation)?;
                    writeln!(out, "Output: {}", step.output)?;
                }
                writeln!(out, "Final answer: {}", result.final_answer)?;
            }
            Outcome::DecodeFailed { error, raw } => {
                writeln!(
                    err,
                    "Choice {}: failed to decode payload: {} (raw: {})",
                    index + 1,
                    error,
                    raw
                )?;
            }
            Outcome::NoContent { refusal } => {
                if let Some(refusal) = refusal {
                    info!("Choice {} refused: {}", index + 1, refusal);
                }
            }
        }
    }

    Ok(())
}
