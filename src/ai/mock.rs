use super::Transport;
use crate::error::TransportError;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};

/// A request captured by [`MockTransport`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_slice(&self.body)
    }
}

/// Scripted transport: replies are returned in order, the last one repeats.
#[derive(Clone)]
pub struct MockTransport {
    responses: Arc<Mutex<Vec<Result<Vec<u8>, TransportError>>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_body(self, body: impl Into<Vec<u8>>) -> Self {
        self.push(Ok(body.into()));
        self
    }

    pub fn with_json(self, body: serde_json::Value) -> Self {
        self.with_body(body.to_string())
    }

    pub fn with_error(self, error: TransportError) -> Self {
        self.push(Err(error));
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, response: Result<Vec<u8>, TransportError>) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(response);
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: Vec<u8>,
    ) -> Result<Vec<u8>, TransportError> {
        let call = {
            let mut requests = self.requests.lock().unwrap_or_else(PoisonError::into_inner);
            requests.push(RecordedRequest {
                url: url.to_string(),
                headers: headers.to_vec(),
                body,
            });
            requests.len()
        };

        let responses = self.responses.lock().unwrap_or_else(PoisonError::into_inner);
        match responses.get(call - 1).or_else(|| responses.last()) {
            Some(response) => response.clone(),
            None => Ok(b"{\"choices\":[]}".to_vec()),
        }
    }
}
