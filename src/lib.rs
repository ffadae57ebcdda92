//! Typed structured-output client for chat-completion endpoints
//!
//! Sends a prompt to a remote model together with a JSON Schema derived from
//! a Rust payload type, then decodes and validates each returned choice back
//! into that type.

pub mod ai;
pub mod app;
pub mod codec;
pub mod error;
pub mod extract;
pub mod models;
pub mod prompts;
pub mod schema;

pub use error::{Error, Result, TransportError};
