//! TOML deck parser.
//!
//! Loads decks from TOML files and directories, writes them back, and
//! validates them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{stable_id, Article, Deck, Paragraph, Word};

/// Intermediate TOML structure for deck files.
#[derive(Debug, Serialize, Deserialize)]
struct TomlDeckFile {
    deck: TomlDeckHeader,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    words: Vec<TomlWord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    articles: Vec<TomlArticle>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TomlDeckHeader {
    id: String,
    name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    description: String,
    language: String,
    #[serde(default = "default_native_language")]
    native_language: String,
}

fn default_native_language() -> String {
    "en".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct TomlWord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<Uuid>,
    text: String,
    meaning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reading: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tokens: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    accent: Option<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TomlArticle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<Uuid>,
    title: String,
    /// Whole text, split on blank lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    /// Whole translation, paired with `text` paragraphs by position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    meaning: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    paragraphs: Vec<TomlParagraph>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TomlParagraph {
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    meaning: Option<String>,
}

/// Parse a single TOML file into a `Deck`.
pub fn parse_deck(path: &Path) -> Result<Deck> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read deck file: {}", path.display()))?;

    parse_deck_str(&content, path)
}

/// Parse a TOML string into a `Deck` (useful for testing).
pub fn parse_deck_str(content: &str, source_path: &Path) -> Result<Deck> {
    let parsed: TomlDeckFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let deck_id = parsed.deck.id;

    let words = parsed
        .words
        .into_iter()
        .map(|w| Word {
            id: w.id.unwrap_or_else(|| stable_id(&deck_id, "word", &w.text)),
            text: w.text.trim().to_string(),
            meaning: w.meaning.trim().to_string(),
            reading: w.reading,
            tokens: w.tokens,
            accent: w.accent,
            tags: w.tags,
        })
        .collect();

    let articles = parsed
        .articles
        .into_iter()
        .map(|a| {
            let mut article = match &a.text {
                Some(text) => Article::from_text(&deck_id, &a.title, text, a.meaning.as_deref()),
                None => Article {
                    id: stable_id(&deck_id, "article", &a.title),
                    title: a.title.clone(),
                    paragraphs: Vec::new(),
                },
            };
            article.paragraphs.extend(a.paragraphs.into_iter().map(|p| Paragraph {
                text: p.text.trim().to_string(),
                meaning: p.meaning.map(|m| m.trim().to_string()),
            }));
            if let Some(id) = a.id {
                article.id = id;
            }
            article
        })
        .collect();

    Ok(Deck {
        id: deck_id,
        name: parsed.deck.name,
        description: parsed.deck.description,
        language: parsed.deck.language,
        native_language: parsed.deck.native_language,
        words,
        articles,
    })
}

/// Recursively load all `.toml` deck files from a directory.
pub fn load_deck_directory(dir: &Path) -> Result<Vec<Deck>> {
    let mut decks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            decks.extend(load_deck_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_deck(&path) {
                Ok(deck) => decks.push(deck),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    decks.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(decks)
}

/// Load a single deck file, or every deck under a directory.
pub fn load_decks(path: &Path) -> Result<Vec<Deck>> {
    if path.is_dir() {
        load_deck_directory(path)
    } else {
        Ok(vec![parse_deck(path)?])
    }
}

/// Serialize a deck to TOML.
///
/// Ids are written only where they differ from the derived ones, and
/// articles are always written with explicit paragraphs.
pub fn deck_to_toml(deck: &Deck) -> Result<String> {
    let file = TomlDeckFile {
        deck: TomlDeckHeader {
            id: deck.id.clone(),
            name: deck.name.clone(),
            description: deck.description.clone(),
            language: deck.language.clone(),
            native_language: deck.native_language.clone(),
        },
        words: deck
            .words
            .iter()
            .map(|w| TomlWord {
                id: (w.id != stable_id(&deck.id, "word", &w.text)).then_some(w.id),
                text: w.text.clone(),
                meaning: w.meaning.clone(),
                reading: w.reading.clone(),
                tokens: w.tokens.clone(),
                accent: w.accent,
                tags: w.tags.clone(),
            })
            .collect(),
        articles: deck
            .articles
            .iter()
            .map(|a| TomlArticle {
                id: (a.id != stable_id(&deck.id, "article", &a.title)).then_some(a.id),
                title: a.title.clone(),
                text: None,
                meaning: None,
                paragraphs: a
                    .paragraphs
                    .iter()
                    .map(|p| TomlParagraph {
                        text: p.text.clone(),
                        meaning: p.meaning.clone(),
                    })
                    .collect(),
            })
            .collect(),
    };
    toml::to_string_pretty(&file).context("failed to serialize deck")
}

/// Write a deck to a TOML file.
pub fn write_deck(deck: &Deck, path: &Path) -> Result<()> {
    let content = deck_to_toml(deck)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("failed to write deck to {}", path.display()))?;
    Ok(())
}

/// A warning from deck validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The word text or article title (if applicable).
    pub subject: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn new(subject: &str, message: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.to_string()),
            message: message.into(),
        }
    }
}

/// Validate a deck for common issues.
pub fn validate_deck(deck: &Deck) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if deck.words.len() < 2 {
        warnings.push(ValidationWarning {
            subject: None,
            message: "fewer than two words, selection practices need distractors".into(),
        });
    }

    // Duplicates
    let mut seen_texts = HashSet::new();
    let mut seen_ids = HashSet::new();
    for w in &deck.words {
        if !seen_texts.insert(w.text.as_str()) {
            warnings.push(ValidationWarning::new(&w.text, "duplicate word"));
        }
        if !seen_ids.insert(w.id) {
            warnings.push(ValidationWarning::new(&w.text, format!("duplicate id: {}", w.id)));
        }
    }
    for a in &deck.articles {
        if !seen_ids.insert(a.id) {
            warnings.push(ValidationWarning::new(&a.title, format!("duplicate id: {}", a.id)));
        }
    }

    for w in &deck.words {
        if w.text.trim().is_empty() {
            warnings.push(ValidationWarning::new(&w.text, "text is empty"));
        }
        if w.meaning.trim().is_empty() {
            warnings.push(ValidationWarning::new(&w.text, "meaning is empty"));
        }
        match w.accent {
            Some(_) if w.tokens.is_empty() => {
                warnings.push(ValidationWarning::new(&w.text, "accent given without tokens"));
            }
            Some(accent) if usize::from(accent) > w.tokens.len() => {
                warnings.push(ValidationWarning::new(
                    &w.text,
                    format!("accent {accent} is beyond the last of {} tokens", w.tokens.len()),
                ));
            }
            _ => {}
        }
    }

    for a in &deck.articles {
        if a.paragraphs.is_empty() {
            warnings.push(ValidationWarning::new(&a.title, "article has no paragraphs"));
            continue;
        }
        let missing = a.paragraphs.iter().filter(|p| !p.has_meaning()).count();
        if missing > 0 {
            warnings.push(ValidationWarning::new(
                &a.title,
                format!(
                    "{missing} paragraph(s) without meaning, no reading or translation practice for them"
                ),
            ));
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[deck]
id = "ja-basics"
name = "Japanese basics"
description = "First words"
language = "ja"
native_language = "en"

[[words]]
text = "雨"
meaning = "rain"
reading = "あめ"
tokens = ["あ", "め"]
accent = 1
tags = ["weather"]

[[words]]
text = "猫"
meaning = "cat; kitty"

[[articles]]
title = "Weather"
text = """
今日は雨です。

猫が寝ています。
"""
meaning = """
It is raining today.

The cat is sleeping.
"""

[[articles]]
title = "Explicit"

[[articles.paragraphs]]
text = "一"
meaning = "one"

[[articles.paragraphs]]
text = "二"
"#;

    fn parse(content: &str) -> Deck {
        parse_deck_str(content, &PathBuf::from("test.toml")).unwrap()
    }

    #[test]
    fn parse_valid_toml() {
        let deck = parse(VALID_TOML);
        assert_eq!(deck.id, "ja-basics");
        assert_eq!(deck.words.len(), 2);
        assert_eq!(deck.words[0].tokens, vec!["あ", "め"]);
        assert_eq!(deck.words[0].accent, Some(1));
        assert_eq!(deck.words[0].id, stable_id("ja-basics", "word", "雨"));

        assert_eq!(deck.articles.len(), 2);
        let weather = &deck.articles[0];
        assert_eq!(weather.paragraphs.len(), 2);
        assert_eq!(
            weather.paragraphs[1].meaning.as_deref(),
            Some("The cat is sleeping.")
        );
        let explicit = &deck.articles[1];
        assert_eq!(explicit.paragraphs.len(), 2);
        assert!(!explicit.paragraphs[1].has_meaning());
    }

    #[test]
    fn parse_missing_optional_fields() {
        let toml = r#"
[deck]
id = "min"
name = "Minimal"
language = "de"
"#;
        let deck = parse(toml);
        assert_eq!(deck.native_language, "en");
        assert!(deck.words.is_empty());
        assert!(deck.articles.is_empty());
    }

    #[test]
    fn explicit_ids_are_kept() {
        let toml = r#"
[deck]
id = "d"
name = "D"
language = "de"

[[words]]
id = "6f1c1e0e-8a4b-4f7e-9c1d-2b3a4c5d6e7f"
text = "Hund"
meaning = "dog"
"#;
        let deck = parse(toml);
        assert_eq!(
            deck.words[0].id.to_string(),
            "6f1c1e0e-8a4b-4f7e-9c1d-2b3a4c5d6e7f"
        );
    }

    #[test]
    fn parse_errors_name_the_file() {
        let err = parse_deck_str("[deck]\nid = 1", &PathBuf::from("broken.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("broken.toml"));
    }

    #[test]
    fn write_and_read_back() {
        let deck = parse(VALID_TOML);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("deck.toml");
        write_deck(&deck, &path).unwrap();

        let back = parse_deck(&path).unwrap();
        assert_eq!(back, deck);

        let text = std::fs::read_to_string(&path).unwrap();
        let id_lines = text
            .lines()
            .filter(|l| l.trim_start().starts_with("id ="))
            .count();
        assert_eq!(id_lines, 1, "derived ids are not written:\n{text}");
    }

    #[test]
    fn load_directory_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("bad.toml"), "not = [valid").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(
            nested.join("other.toml"),
            "[deck]\nid = \"a-other\"\nname = \"Other\"\nlanguage = \"de\"\n",
        )
        .unwrap();

        let decks = load_deck_directory(dir.path()).unwrap();
        let ids: Vec<&str> = decks.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a-other", "ja-basics"]);

        assert!(load_deck_directory(&dir.path().join("good.toml")).is_err());
        assert_eq!(load_decks(&dir.path().join("good.toml")).unwrap().len(), 1);
    }

    #[test]
    fn valid_deck_only_warns_about_missing_meanings() {
        let warnings = validate_deck(&parse(VALID_TOML));
        assert_eq!(warnings.len(), 1, "{warnings:?}");
        assert_eq!(warnings[0].subject.as_deref(), Some("Explicit"));
    }

    #[test]
    fn validate_catches_problems() {
        let toml = r#"
[deck]
id = "d"
name = "D"
language = "ja"

[[words]]
text = "雨"
meaning = ""
accent = 1

[[words]]
text = "雨"
meaning = "rain"
tokens = ["あ", "め"]
accent = 3

[[articles]]
title = "Empty"
"#;
        let warnings = validate_deck(&parse(toml));
        let messages: Vec<&str> = warnings.iter().map(|w| w.message.as_str()).collect();

        assert!(messages.contains(&"duplicate word"));
        assert!(messages.iter().any(|m| m.starts_with("duplicate id")));
        assert!(messages.contains(&"meaning is empty"));
        assert!(messages.contains(&"accent given without tokens"));
        assert!(messages.iter().any(|m| m.contains("accent 3 is beyond")));
        assert!(messages.contains(&"article has no paragraphs"));
    }

    #[test]
    fn validate_small_deck() {
        let toml = r#"
[deck]
id = "d"
name = "D"
language = "ja"

[[words]]
text = "雨"
meaning = "rain"
"#;
        let warnings = validate_deck(&parse(toml));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].subject.is_none());
    }
}
