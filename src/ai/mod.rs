//! Chat-completion integration
//!
//! The network call sits behind [`Transport`] so the request/response
//! pipeline can run against a scripted transport in tests and against
//! `reqwest` in production.

pub mod mock;
pub mod openai;
pub mod transport;

pub use mock::{MockTransport, RecordedRequest};
pub use openai::{ChatClient, ChatRequest, ChatResponseEnvelope, Choice, Message, Role};
pub use transport::ReqwestTransport;

use crate::error::TransportError;
use async_trait::async_trait;

#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` to `url` and return the response body of a 2xx reply.
    async fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: Vec<u8>,
    ) -> Result<Vec<u8>, TransportError>;
}
