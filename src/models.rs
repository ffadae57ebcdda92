//! Data models and structures
//!
//! Defines the reasoning payload the model is asked to produce and the
//! runtime configuration loaded from the environment.

use crate::schema::StructuredOutput;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gpt-4o-2024-08-06";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// One intermediate step of a worked solution.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ReasoningStep {
    /// What was done in this step.
    pub explanation: String,
    /// The value produced by this step.
    pub output: f64,
}

/// A worked solution: ordered steps followed by the final answer.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ReasoningResult {
    pub steps: Vec<ReasoningStep>,
    pub final_answer: f64,
}

impl StructuredOutput for ReasoningResult {
    const SCHEMA_NAME: &'static str = "math_reasoning";
}

// Configuration
#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    pub debug: bool,
    pub strict: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("debug", &self.debug)
            .field("strict", &self.strict)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| crate::Error::Config(format!("{} not set", API_KEY_VAR)))?;

        let timeout_secs = match lookup("OPENAI_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                crate::Error::Config(format!("Invalid OPENAI_TIMEOUT_SECS '{}'", raw))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_key,
            model: lookup("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: lookup("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
            debug: false,
            strict: false,
        })
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_reasoning_result_serialization() {
        let result = ReasoningResult {
            steps: vec![ReasoningStep {
                explanation: "add".to_string(),
                output: 4.0,
            }],
            final_answer: 4.0,
        };

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"final_answer\":4.0"));
        assert!(json.contains("\"explanation\":\"add\""));
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup_from(&[(API_KEY_VAR, "sk-test")])).unwrap();

        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(!config.debug);
        assert!(!config.strict);
    }

    #[test]
    fn test_config_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            (API_KEY_VAR, "sk-test"),
            ("OPENAI_MODEL", "gpt-4o-mini"),
            ("OPENAI_BASE_URL", "http://localhost:8080"),
            ("OPENAI_TIMEOUT_SECS", "5"),
        ]))
        .unwrap()
        .with_model("o3-mini".to_string())
        .with_debug(true);

        assert_eq!(config.model, "o3-mini");
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(config.debug);
    }

    #[test]
    fn test_config_missing_api_key() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, crate::Error::Config(msg) if msg.contains(API_KEY_VAR)));
    }

    #[test]
    fn test_config_blank_api_key() {
        let err = Config::from_lookup(lookup_from(&[(API_KEY_VAR, "  ")])).unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn test_config_invalid_timeout() {
        let err = Config::from_lookup(lookup_from(&[
            (API_KEY_VAR, "sk-test"),
            ("OPENAI_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, crate::Error::Config(msg) if msg.contains("soon")));
    }

    #[test]
    fn test_config_debug_redacts_key() {
        let config = Config::from_lookup(lookup_from(&[(API_KEY_VAR, "sk-secret")])).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
