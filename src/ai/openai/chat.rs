use super::types::{ChatRequest, ChatResponseEnvelope};
use crate::ai::Transport;
use crate::models::DEFAULT_BASE_URL;
use crate::{Error, Result};
use std::fmt;

pub const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Sends one chat completion request and decodes the response envelope.
pub struct ChatClient {
    transport: Box<dyn Transport>,
    api_key: String,
    base_url: String,
    debug: bool,
}

impl fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

impl ChatClient {
    pub fn new(transport: Box<dyn Transport>, api_key: String) -> Self {
        Self {
            transport,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            debug: false,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Dump request and response bodies at debug level. Headers are never dumped.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, CHAT_COMPLETIONS_PATH)
    }

    pub async fn send(&self, request: &ChatRequest) -> Result<ChatResponseEnvelope> {
        let body = serde_json::to_vec(request)?;
        if self.debug {
            tracing::debug!("Request body: {}", String::from_utf8_lossy(&body));
        }

        let headers = vec![
            (
                "Authorization".to_string(),
                format!("Bearer {}", self.api_key),
            ),
            ("Content-Type".to_string(), "application/json".to_string()),
        ];

        tracing::debug!(
            "Sending chat completion request (model: {}, messages: {})",
            request.model,
            request.messages.len()
        );
        let response = self
            .transport
            .post(&self.endpoint(), &headers, body)
            .await?;

        let text = String::from_utf8_lossy(&response).into_owned();
        if self.debug {
            tracing::debug!("Response body: {}", text);
        }

        serde_json::from_str(&text).map_err(|e| {
            tracing::debug!("Failed to parse chat completion response: {}", e);
            Error::EnvelopeParse {
                message: e.to_string(),
                body: text,
            }
        })
    }
}
