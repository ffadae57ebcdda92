//! Wire-level chat completion request and response payloads.
//!
//! Response types deserialize leniently: fields this client does not model
//! are ignored, since the remote API evolves independently.

use crate::schema::{strict_schema, SchemaError, StructuredOutput};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormatKind {
    JsonSchema,
}

/// Structured response-format directive for chat completions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseFormatSpec {
    #[serde(rename = "type")]
    pub kind: ResponseFormatKind,
    pub json_schema: JsonSchemaSpec,
}

/// Named schema the remote service enforces on its output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonSchemaSpec {
    pub name: String,
    pub schema: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

impl ResponseFormatSpec {
    pub fn json_schema(name: impl Into<String>, schema: serde_json::Value) -> Self {
        Self {
            kind: ResponseFormatKind::JsonSchema,
            json_schema: JsonSchemaSpec {
                name: name.into(),
                schema,
                strict: None,
            },
        }
    }

    /// Derive the directive for `T`.
    pub fn for_output<T: StructuredOutput>() -> Result<Self, SchemaError> {
        Ok(Self::json_schema(T::SCHEMA_NAME, strict_schema::<T>()?))
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.json_schema.strict = Some(strict);
        self
    }
}

/// Request body for chat completions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub response_format: ResponseFormatSpec,
}

impl ChatRequest {
    pub fn new(
        model: impl Into<String>,
        messages: Vec<Message>,
        response_format: ResponseFormatSpec,
    ) -> Self {
        Self {
            model: model.into(),
            messages,
            response_format,
        }
    }
}

/// Top-level chat completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponseEnvelope {
    pub choices: Vec<Choice>,
}

/// Single choice item returned by chat completions.
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
    /// Set instead of `content` when the model declines to answer.
    #[serde(default)]
    pub refusal: Option<String>,
}
