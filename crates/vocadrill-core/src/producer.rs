//! Practice producers.
//!
//! [`WordPracticeProducer`] picks words by scheduler weight and turns each
//! into one of the word-based practice shapes. [`ArticlePracticeProducer`]
//! does the same for article paragraphs (reading and translation).

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PracticeError;
use crate::history::History;
use crate::model::{Deck, Word};
use crate::practice::{Practice, PracticeKind, PracticeKindTag, SelectionDirection, Subject};
use crate::scheduler::{Schedule, SchedulerConfig};
use crate::text::{is_unspaced_script, normalize};

/// Marker that replaces the word in context practices.
pub const BLANK: &str = "____";

/// Marker placed after the accented token.
pub const ACCENT_MARK: &str = "ꜜ";

/// Which practices to generate and how.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProducerConfig {
    /// Options per multiple-choice practice (at least 2).
    #[serde(default = "default_choice_count")]
    pub choice_count: usize,
    /// Enabled practice kinds.
    #[serde(default = "default_kinds")]
    pub kinds: Vec<PracticeKindTag>,
}

fn default_choice_count() -> usize {
    4
}

fn default_kinds() -> Vec<PracticeKindTag> {
    PracticeKindTag::WORD_KINDS
        .iter()
        .chain(PracticeKindTag::ARTICLE_KINDS.iter())
        .copied()
        .collect()
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            choice_count: default_choice_count(),
            kinds: default_kinds(),
        }
    }
}

impl ProducerConfig {
    fn word_kinds(&self) -> Vec<PracticeKindTag> {
        self.kinds.iter().copied().filter(|k| k.is_word_kind()).collect()
    }

    fn article_kinds(&self) -> Vec<PracticeKindTag> {
        self.kinds.iter().copied().filter(|k| !k.is_word_kind()).collect()
    }
}

fn practice_id<R: Rng + ?Sized>(rng: &mut R) -> Uuid {
    uuid::Builder::from_random_bytes(rng.gen()).into_uuid()
}

/// Generates practices from words.
pub struct WordPracticeProducer<'a, R> {
    deck: &'a Deck,
    schedule: Schedule,
    config: ProducerConfig,
    rng: R,
}

impl<'a, R: Rng> WordPracticeProducer<'a, R> {
    pub fn new(
        deck: &'a Deck,
        history: &History,
        scheduler: &SchedulerConfig,
        config: ProducerConfig,
        rng: R,
    ) -> Self {
        Self {
            deck,
            schedule: Schedule::for_words(deck, history, scheduler),
            config,
            rng,
        }
    }

    /// Hand back the RNG, e.g. to continue with another producer.
    pub fn into_rng(self) -> R {
        self.rng
    }

    /// Pick up to `count` distinct words by weight.
    pub fn next_words(&mut self, count: usize) -> Vec<&'a Word> {
        let deck = self.deck;
        self.schedule
            .sample(count, &mut self.rng)
            .into_iter()
            .filter_map(|e| match e.subject {
                Subject::Word { id } => deck.word(id),
                Subject::Paragraph { .. } => None,
            })
            .collect()
    }

    /// Produce up to `count` practices, one per picked word.
    ///
    /// For each word the enabled kinds are tried in random order and the
    /// first feasible one is used. Words with no feasible kind are skipped.
    pub fn produce(&mut self, count: usize) -> Vec<Practice> {
        let kinds = self.config.word_kinds();
        if kinds.is_empty() {
            return Vec::new();
        }

        let words = self.next_words(count);
        let mut practices = Vec::with_capacity(words.len());
        for word in words {
            let mut order = kinds.clone();
            order.shuffle(&mut self.rng);

            let built = order.into_iter().find_map(|kind| match self.build(word, kind) {
                Ok(p) => Some(p),
                Err(e) => {
                    tracing::trace!(word = %word.text, %kind, "not feasible: {e}");
                    None
                }
            });
            match built {
                Some(p) => practices.push(p),
                None => tracing::debug!(word = %word.text, "no feasible practice, skipping"),
            }
        }
        practices
    }

    /// Build a practice of a specific kind for a word.
    pub fn build(&mut self, word: &Word, kind: PracticeKindTag) -> Result<Practice, PracticeError> {
        match kind {
            PracticeKindTag::Selection => self.selection(word),
            PracticeKindTag::Filling => self.filling(word),
            PracticeKindTag::Reordering => self.reordering(word),
            PracticeKindTag::Accent => self.accent(word),
            PracticeKindTag::Context => self.context(word),
            other => Err(PracticeError::Empty(format!(
                "{other} practices are built from articles"
            ))),
        }
    }

    /// Multiple choice: pick the meaning for a word, or the word for a meaning.
    pub fn selection(&mut self, word: &Word) -> Result<Practice, PracticeError> {
        let direction = if self.rng.gen_bool(0.5) {
            SelectionDirection::TextToMeaning
        } else {
            SelectionDirection::MeaningToText
        };
        self.selection_with(word, direction)
    }

    pub fn selection_with(
        &mut self,
        word: &Word,
        direction: SelectionDirection,
    ) -> Result<Practice, PracticeError> {
        let (prompt, correct) = match direction {
            SelectionDirection::TextToMeaning => (word.text.clone(), word.meaning.clone()),
            SelectionDirection::MeaningToText => (word.meaning.clone(), word.text.clone()),
        };

        // Distractors must not collide with any accepted answer.
        let taken: HashSet<String> = match direction {
            SelectionDirection::TextToMeaning => {
                word.meanings().iter().map(|m| normalize(m, true)).collect()
            }
            SelectionDirection::MeaningToText => [normalize(&word.text, true)].into(),
        };
        // For word options, a word sharing any meaning with the target is also right.
        let target_meanings: HashSet<String> =
            word.meanings().iter().map(|m| normalize(m, true)).collect();
        let deck = self.deck;
        let mut seen = taken;
        let mut candidates: Vec<&str> = Vec::new();
        for other in &deck.words {
            if other.id == word.id {
                continue;
            }
            if direction == SelectionDirection::MeaningToText
                && other
                    .meanings()
                    .iter()
                    .any(|m| target_meanings.contains(&normalize(m, true)))
            {
                continue;
            }
            let (display, keys) = match direction {
                SelectionDirection::TextToMeaning => (
                    other.meaning.as_str(),
                    other.meanings().iter().map(|m| normalize(m, true)).collect::<Vec<_>>(),
                ),
                SelectionDirection::MeaningToText => {
                    (other.text.as_str(), vec![normalize(&other.text, true)])
                }
            };
            if display.trim().is_empty() || keys.iter().any(|k| seen.contains(k)) {
                continue;
            }
            seen.extend(keys);
            candidates.push(display);
        }

        if candidates.is_empty() {
            return Err(PracticeError::NotEnoughOptions {
                needed: 2,
                available: 1,
            });
        }

        let n_options = self.config.choice_count.max(2).min(candidates.len() + 1);
        let mut options: Vec<String> = candidates
            .choose_multiple(&mut self.rng, n_options - 1)
            .map(|s| s.to_string())
            .collect();
        options.push(correct.clone());
        options.shuffle(&mut self.rng);
        let answer = options.iter().position(|o| *o == correct).unwrap_or(0);

        Ok(Practice {
            id: practice_id(&mut self.rng),
            subject: Subject::word(word.id),
            prompt,
            kind: PracticeKind::Selection {
                direction,
                options,
                answer,
            },
        })
    }

    /// Fill-in: show the meaning and a first-letter hint, type the word.
    pub fn filling(&mut self, word: &Word) -> Result<Practice, PracticeError> {
        let text = word.text.trim();
        if text.is_empty() {
            return Err(PracticeError::Empty("word has no text".into()));
        }

        let mut chars = text.chars();
        let mut hint = String::new();
        if let Some(first) = chars.next() {
            hint.push(first);
        }
        for c in chars {
            hint.push(if c.is_whitespace() { ' ' } else { '_' });
        }

        Ok(Practice {
            id: practice_id(&mut self.rng),
            subject: Subject::word(word.id),
            prompt: word.meaning.clone(),
            kind: PracticeKind::Filling {
                hint,
                key: text.to_string(),
            },
        })
    }

    /// Reordering: put the word's shuffled tokens back in order.
    ///
    /// Uses the phonetic tokens when present, otherwise the characters of the
    /// text.
    pub fn reordering(&mut self, word: &Word) -> Result<Practice, PracticeError> {
        let key: Vec<String> = if word.tokens.len() >= 2 {
            word.tokens.clone()
        } else {
            word.text.trim().chars().map(String::from).collect()
        };
        let distinct: HashSet<&String> = key.iter().collect();
        if distinct.len() < 2 {
            return Err(PracticeError::MissingTokens(word.text.clone()));
        }

        let mut pieces = key.clone();
        pieces.shuffle(&mut self.rng);
        if pieces == key {
            pieces.rotate_left(1);
        }

        Ok(Practice {
            id: practice_id(&mut self.rng),
            subject: Subject::word(word.id),
            prompt: word.meaning.clone(),
            kind: PracticeKind::Reordering { pieces, key },
        })
    }

    /// Accent selection: choose where the pitch drops.
    pub fn accent(&mut self, word: &Word) -> Result<Practice, PracticeError> {
        let Some(accent) = word.accent.map(usize::from) else {
            return Err(PracticeError::MissingAccent(word.text.clone()));
        };
        if word.tokens.is_empty() || accent > word.tokens.len() {
            return Err(PracticeError::MissingAccent(word.text.clone()));
        }

        let options = accent_options(&word.tokens);
        Ok(Practice {
            id: practice_id(&mut self.rng),
            subject: Subject::word(word.id),
            prompt: word.text.clone(),
            kind: PracticeKind::Accent {
                reading: word.tokens.concat(),
                options,
                answer: accent,
            },
        })
    }

    /// Context: fill the word back into a sentence from an article.
    pub fn context(&mut self, word: &Word) -> Result<Practice, PracticeError> {
        let needle = word.text.trim();
        if needle.is_empty() {
            return Err(PracticeError::NoContext(word.text.clone()));
        }

        let deck = self.deck;
        let mut sentences: Vec<String> = Vec::new();
        for article in &deck.articles {
            for p in &article.paragraphs {
                for sentence in split_sentences(&p.text) {
                    if let Some(blanked) = blank_out(&sentence, needle) {
                        sentences.push(blanked);
                    }
                }
            }
        }

        let Some(sentence) = sentences.choose(&mut self.rng).cloned() else {
            return Err(PracticeError::NoContext(word.text.clone()));
        };

        Ok(Practice {
            id: practice_id(&mut self.rng),
            subject: Subject::word(word.id),
            prompt: format!("{sentence} ({})", word.meaning),
            kind: PracticeKind::Context {
                sentence,
                key: needle.to_string(),
            },
        })
    }
}

/// One option per accent position; 0 is flat.
pub fn accent_options(tokens: &[String]) -> Vec<String> {
    (0..=tokens.len())
        .map(|p| {
            if p == 0 {
                format!("{} (flat)", tokens.concat())
            } else {
                format!("{}{ACCENT_MARK}{}", tokens[..p].concat(), tokens[p..].concat())
            }
        })
        .collect()
}

/// Split a paragraph into sentences, keeping terminators.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        if c == '\n' {
            current.push(' ');
            continue;
        }
        current.push(c);
        if matches!(c, '.' | '!' | '?' | '。' | '！' | '？') {
            let s = current.trim();
            if !s.is_empty() {
                sentences.push(s.to_string());
            }
            current.clear();
        }
    }
    let s = current.trim();
    if !s.is_empty() {
        sentences.push(s.to_string());
    }
    sentences
}

/// Replace the first occurrence of `needle` (case-insensitively where
/// possible) with [`BLANK`].
///
/// In spaced scripts the match must be a whole word, so `cat` is not
/// found inside `category`.
fn blank_out(sentence: &str, needle: &str) -> Option<String> {
    let start = find_word(sentence, needle).or_else(|| {
        let lower = sentence.to_lowercase();
        let needle_lower = needle.to_lowercase();
        // Only safe when lowercasing kept byte offsets intact.
        if lower.len() != sentence.len() || needle_lower.len() != needle.len() {
            return None;
        }
        find_word(&lower, &needle_lower)
    })?;
    Some(format!(
        "{}{BLANK}{}",
        &sentence[..start],
        &sentence[start + needle.len()..]
    ))
}

fn find_word(haystack: &str, needle: &str) -> Option<usize> {
    let spaced = !needle.chars().any(is_unspaced_script);
    haystack
        .match_indices(needle)
        .map(|(i, _)| i)
        .find(|&i| {
            if !spaced {
                return true;
            }
            let before = haystack[..i].chars().next_back();
            let after = haystack[i + needle.len()..].chars().next();
            !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
        })
}

/// Generates reading and translation practices from article paragraphs.
pub struct ArticlePracticeProducer<'a, R> {
    deck: &'a Deck,
    schedule: Schedule,
    kinds: Vec<PracticeKindTag>,
    rng: R,
}

impl<'a, R: Rng> ArticlePracticeProducer<'a, R> {
    pub fn new(
        deck: &'a Deck,
        history: &History,
        scheduler: &SchedulerConfig,
        config: &ProducerConfig,
        rng: R,
    ) -> Self {
        Self {
            deck,
            schedule: Schedule::for_paragraphs(deck, history, scheduler),
            kinds: config.article_kinds(),
            rng,
        }
    }

    pub fn into_rng(self) -> R {
        self.rng
    }

    /// Whether any paragraph can be practiced.
    pub fn has_material(&self) -> bool {
        !self.kinds.is_empty() && !self.schedule.is_empty()
    }

    /// Produce up to `count` practices from distinct paragraphs.
    pub fn produce(&mut self, count: usize) -> Vec<Practice> {
        if self.kinds.is_empty() {
            return Vec::new();
        }
        let subjects: Vec<Subject> = self
            .schedule
            .sample(count, &mut self.rng)
            .into_iter()
            .map(|e| e.subject)
            .collect();

        let mut practices = Vec::with_capacity(subjects.len());
        for subject in subjects {
            let Subject::Paragraph { article, index } = subject else {
                continue;
            };
            let Some(&kind) = self.kinds.choose(&mut self.rng) else {
                break;
            };
            let built = match kind {
                PracticeKindTag::Translation => self.translation(article, index),
                _ => self.reading(article, index),
            };
            match built {
                Ok(p) => practices.push(p),
                Err(e) => tracing::debug!(%article, index, "skipping paragraph: {e}"),
            }
        }
        practices
    }

    /// Reading: translate the paragraph into the native language.
    pub fn reading(&mut self, article: Uuid, index: usize) -> Result<Practice, PracticeError> {
        let (text, meaning) = self.paragraph(article, index)?;
        Ok(Practice {
            id: practice_id(&mut self.rng),
            subject: Subject::paragraph(article, index),
            prompt: text,
            kind: PracticeKind::Reading { key: meaning },
        })
    }

    /// Translation: write the paragraph in the target language from its meaning.
    pub fn translation(&mut self, article: Uuid, index: usize) -> Result<Practice, PracticeError> {
        let (text, meaning) = self.paragraph(article, index)?;
        Ok(Practice {
            id: practice_id(&mut self.rng),
            subject: Subject::paragraph(article, index),
            prompt: meaning,
            kind: PracticeKind::Translation { key: text },
        })
    }

    fn paragraph(&self, article: Uuid, index: usize) -> Result<(String, String), PracticeError> {
        let p = self
            .deck
            .paragraph(article, index)
            .ok_or_else(|| PracticeError::Empty(format!("no paragraph {index} in {article}")))?;
        match &p.meaning {
            Some(m) if !m.trim().is_empty() => Ok((p.text.clone(), m.clone())),
            _ => Err(PracticeError::Empty("paragraph has no meaning".into())),
        }
    }
}

/// Produce a mixed session: word practices first, then article practices.
///
/// When both sources are available, a quarter of the session (at least one
/// practice) comes from articles.
pub fn produce_session<R: Rng>(
    deck: &Deck,
    history: &History,
    scheduler: &SchedulerConfig,
    config: &ProducerConfig,
    count: usize,
    rng: R,
) -> (Vec<Practice>, R) {
    let has_word_kinds = !config.word_kinds().is_empty() && !deck.words.is_empty();
    let articles = ArticlePracticeProducer::new(deck, history, scheduler, config, rng);

    let article_count = match (has_word_kinds, articles.has_material()) {
        (_, false) => 0,
        (false, true) => count,
        (true, true) => (count / 4).max(1).min(count),
    };
    let word_count = count - article_count;

    let rng = articles.into_rng();
    let mut words = WordPracticeProducer::new(deck, history, scheduler, config.clone(), rng);
    let mut practices = words.produce(word_count);

    let rng = words.into_rng();
    let mut articles = ArticlePracticeProducer::new(deck, history, scheduler, config, rng);
    practices.extend(articles.produce(article_count));

    (practices, articles.into_rng())
}
