//! Offline glossary translator.
//!
//! Translates word by word from a fixed glossary, preferring the longest
//! entry that matches at each position. Useful as a last resort in the
//! translator chain and for decks whose words already cover their articles.

use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use vocadrill_core::error::TranslateError;
use vocadrill_core::model::Deck;
use vocadrill_core::text::tokenize;
use vocadrill_core::traits::{TranslateRequest, TranslateResponse, Translator};

/// Default share of source tokens the glossary must cover.
pub const DEFAULT_MIN_COVERAGE: f64 = 0.5;

/// A glossary file.
///
/// ```toml
/// source_language = "ja"
/// target_language = "en"
///
/// [entries]
/// "今日" = "today"
/// "雨" = "rain"
/// ```
#[derive(Debug, Deserialize)]
struct GlossaryFile {
    source_language: String,
    target_language: String,
    #[serde(default)]
    entries: HashMap<String, String>,
}

/// Word-by-word translator backed by a glossary.
#[derive(Debug, Clone)]
pub struct GlossaryTranslator {
    name: String,
    source_language: String,
    target_language: String,
    /// Tokenized source (joined by spaces) to target text.
    entries: HashMap<String, String>,
    /// Longest entry, in tokens.
    max_tokens: usize,
    min_coverage: f64,
}

impl GlossaryTranslator {
    pub fn new(source_language: &str, target_language: &str, min_coverage: f64) -> Self {
        Self {
            name: "glossary".to_string(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            entries: HashMap::new(),
            max_tokens: 0,
            min_coverage,
        }
    }

    /// Build a glossary from a deck's words, using each word's first meaning.
    pub fn from_deck(deck: &Deck, min_coverage: f64) -> Self {
        let mut glossary = Self::new(&deck.language, &deck.native_language, min_coverage);
        for word in &deck.words {
            if let Some(meaning) = word.meanings().first() {
                glossary.insert(&word.text, meaning);
            }
        }
        glossary
    }

    /// Add the entries of a glossary file.
    ///
    /// Fails when the file's language pair differs from this glossary's.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read glossary: {}", path.display()))?;
        let file: GlossaryFile = toml::from_str(&content)
            .with_context(|| format!("failed to parse glossary: {}", path.display()))?;

        if file.source_language != self.source_language
            || file.target_language != self.target_language
        {
            anyhow::bail!(
                "glossary {} is {}→{}, expected {}→{}",
                path.display(),
                file.source_language,
                file.target_language,
                self.source_language,
                self.target_language
            );
        }
        for (source, target) in &file.entries {
            self.insert(source, target);
        }
        tracing::debug!("loaded {} glossary entries from {}", file.entries.len(), path.display());
        Ok(())
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn insert(&mut self, source: &str, target: &str) {
        let tokens = tokenize(source, true);
        let target = target.trim();
        if tokens.is_empty() || target.is_empty() {
            return;
        }
        self.max_tokens = self.max_tokens.max(tokens.len());
        self.entries.insert(tokens.join(" "), target.to_string());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Greedy longest-match translation.
    ///
    /// Returns the translated text and the share of source tokens covered.
    /// Unknown tokens are passed through.
    pub fn gloss(&self, text: &str) -> (String, f64) {
        let tokens = tokenize(text, true);
        if tokens.is_empty() {
            return (String::new(), 0.0);
        }

        let mut out: Vec<&str> = Vec::new();
        let mut covered = 0usize;
        let mut i = 0;
        while i < tokens.len() {
            let longest = self.max_tokens.min(tokens.len() - i);
            let found = (1..=longest).rev().find_map(|n| {
                self.entries
                    .get(&tokens[i..i + n].join(" "))
                    .map(|target| (n, target.as_str()))
            });
            match found {
                Some((n, target)) => {
                    out.push(target);
                    covered += n;
                    i += n;
                }
                None => {
                    out.push(&tokens[i]);
                    i += 1;
                }
            }
        }

        (out.join(" "), covered as f64 / tokens.len() as f64)
    }
}

#[async_trait]
impl Translator for GlossaryTranslator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn translate(&self, request: &TranslateRequest) -> anyhow::Result<TranslateResponse> {
        if request.source_language != self.source_language
            || request.target_language != self.target_language
        {
            return Err(TranslateError::Unsupported(format!(
                "{}→{}",
                request.source_language, request.target_language
            ))
            .into());
        }

        let start = Instant::now();
        let (text, coverage) = self.gloss(&request.text);
        if text.is_empty() {
            return Err(TranslateError::Empty.into());
        }
        if coverage < self.min_coverage {
            return Err(TranslateError::Unsupported(format!(
                "glossary covers {:.0}% of the text",
                coverage * 100.0
            ))
            .into());
        }

        Ok(TranslateResponse {
            text,
            translator: self.name.clone(),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}
