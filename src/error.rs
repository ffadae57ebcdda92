//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.
//! Per-choice payload failures are not part of [`Error`]; they travel as
//! [`DecodeError`](crate::codec::DecodeError) values inside an extraction
//! outcome so one bad choice never aborts the others.

use crate::schema::SchemaError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Failed to parse chat completion response: {message} (body: {body})")]
    EnvelopeParse { message: String, body: String },
}

/// Failure reported by the transport before a usable response body exists.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection refused, timeout, TLS failure and the like.
    #[error("request failed: {0}")]
    Request(String),

    /// The endpoint answered with a non-2xx status.
    #[error("endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, Error>;
