//! Core data model types for vocadrill.
//!
//! A [`Deck`] bundles the learner's [`Word`]s and [`Article`]s. Everything the
//! scheduler and producers do starts from a deck.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A vocabulary entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// Stable identifier, used to key answer history.
    pub id: Uuid,
    /// The word as written in the target language.
    pub text: String,
    /// Meaning in the learner's native language. Alternatives may be
    /// separated by `;`, `,`, `/` or `、`.
    pub meaning: String,
    /// Optional pronunciation (e.g. kana for a kanji word).
    #[serde(default)]
    pub reading: Option<String>,
    /// Phonetic units of the word, in order.
    #[serde(default)]
    pub tokens: Vec<String>,
    /// Pitch-accent position: 0 is flat, `n` drops after token `n`.
    #[serde(default)]
    pub accent: Option<u8>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

const MEANING_SEPARATORS: &[char] = &[';', ',', '/', '、', '；'];

impl Word {
    /// Create a word with an id derived from the deck id and its text.
    pub fn new(deck_id: &str, text: &str, meaning: &str) -> Self {
        Self {
            id: stable_id(deck_id, "word", text),
            text: text.to_string(),
            meaning: meaning.to_string(),
            reading: None,
            tokens: Vec::new(),
            accent: None,
            tags: Vec::new(),
        }
    }

    /// The individual accepted meanings.
    pub fn meanings(&self) -> Vec<&str> {
        let parts: Vec<&str> = self
            .meaning
            .split(MEANING_SEPARATORS)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            vec![self.meaning.trim()]
        } else {
            parts
        }
    }

    /// The reading if present, otherwise the tokens joined, otherwise the text.
    pub fn pronunciation(&self) -> String {
        match &self.reading {
            Some(r) if !r.trim().is_empty() => r.clone(),
            _ if !self.tokens.is_empty() => self.tokens.concat(),
            _ => self.text.clone(),
        }
    }
}

/// One paragraph of an article, optionally paired with its translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub text: String,
    #[serde(default)]
    pub meaning: Option<String>,
}

impl Paragraph {
    pub fn has_meaning(&self) -> bool {
        self.meaning.as_deref().is_some_and(|m| !m.trim().is_empty())
    }
}

/// Longer text used for reading, translation, and context practices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
}

impl Article {
    /// Build an article from raw text, splitting on blank lines.
    ///
    /// Meaning paragraphs are paired with text paragraphs by position; extra
    /// meaning paragraphs are dropped.
    pub fn from_text(deck_id: &str, title: &str, text: &str, meaning: Option<&str>) -> Self {
        let texts = split_paragraphs(text);
        let mut meanings = meaning.map(split_paragraphs).unwrap_or_default().into_iter();
        let paragraphs = texts
            .into_iter()
            .map(|text| Paragraph {
                text,
                meaning: meanings.next(),
            })
            .collect();

        Self {
            id: stable_id(deck_id, "article", title),
            title: title.to_string(),
            paragraphs,
        }
    }
}

/// Split text into paragraphs separated by one or more blank lines.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim());
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }

    paragraphs
}

/// Derive a deterministic id so history survives edits to other entries.
pub fn stable_id(deck_id: &str, kind: &str, key: &str) -> Uuid {
    let name = format!("{deck_id}/{kind}/{}", key.trim());
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
}

/// A collection of words and articles in one target language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    /// Unique identifier for this deck.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Language being learned (e.g. "ja").
    pub language: String,
    /// The learner's language, used for meanings (e.g. "en").
    pub native_language: String,
    #[serde(default)]
    pub words: Vec<Word>,
    #[serde(default)]
    pub articles: Vec<Article>,
}

impl Deck {
    pub fn word(&self, id: Uuid) -> Option<&Word> {
        self.words.iter().find(|w| w.id == id)
    }

    pub fn paragraph(&self, article: Uuid, index: usize) -> Option<&Paragraph> {
        self.articles
            .iter()
            .find(|a| a.id == article)
            .and_then(|a| a.paragraphs.get(index))
    }

    pub fn summary(&self) -> DeckSummary {
        DeckSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            word_count: self.words.len(),
            article_count: self.articles.len(),
        }
    }
}

/// Summary of a deck (without its contents).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckSummary {
    pub id: String,
    pub name: String,
    pub word_count: usize,
    pub article_count: usize,
}
