//! Translator trait definitions.
//!
//! Implemented by the `vocadrill-providers` crate and driven by the
//! translation engine.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A backend that translates text between two languages.
///
/// Implementations should return a [`crate::error::TranslateError`] inside
/// the `anyhow::Error` so the engine can tell permanent failures from
/// transient ones.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Human-readable translator name (e.g. "glossary").
    fn name(&self) -> &str;

    /// Translate a piece of text.
    async fn translate(&self, request: &TranslateRequest) -> anyhow::Result<TranslateResponse>;
}

/// Request to translate text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    /// Language of `text` (e.g. "ja").
    pub source_language: String,
    /// Language to translate into (e.g. "en").
    pub target_language: String,
}

impl TranslateRequest {
    pub fn new(text: impl Into<String>, source: &str, target: &str) -> Self {
        Self {
            text: text.into(),
            source_language: source.to_string(),
            target_language: target.to_string(),
        }
    }
}

/// A successful translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub text: String,
    /// Name of the translator that produced it.
    pub translator: String,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}
