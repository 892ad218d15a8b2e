//! Weighted selection of what to practice next.
//!
//! Each subject gets a weight from its recent answer correctness: unseen
//! subjects and subjects answered badly are drawn more often, mastered ones
//! less often but never excluded. Subjects are then sampled without
//! replacement in proportion to their weights.

use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::grading::Correctness;
use crate::history::History;
use crate::model::Deck;
use crate::practice::Subject;

/// Scheduler tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// How many recent answers count towards mastery.
    #[serde(default = "default_window")]
    pub window: usize,
    /// Weight of a subject that was never answered.
    #[serde(default = "default_unseen_weight")]
    pub unseen_weight: f64,
    /// Weight of a fully mastered subject.
    #[serde(default = "default_min_weight")]
    pub min_weight: f64,
    /// Weight of a subject that was always answered incorrectly.
    #[serde(default = "default_max_weight")]
    pub max_weight: f64,
}

fn default_window() -> usize {
    5
}
fn default_unseen_weight() -> f64 {
    3.0
}
fn default_min_weight() -> f64 {
    0.5
}
fn default_max_weight() -> f64 {
    4.0
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            unseen_weight: default_unseen_weight(),
            min_weight: default_min_weight(),
            max_weight: default_max_weight(),
        }
    }
}

/// Recency-weighted mean correctness of the last `window` answers.
///
/// The most recent answer weighs `window`, the one before `window - 1`, and
/// so on. Returns `None` when there are no answers.
pub fn mastery(records: &[Correctness], window: usize) -> Option<f64> {
    let window = window.max(1);
    let mut total = 0.0;
    let mut weights = 0.0;
    for (i, c) in records.iter().rev().take(window).enumerate() {
        let w = (window - i) as f64;
        total += c.score() * w;
        weights += w;
    }
    if weights == 0.0 {
        None
    } else {
        Some(total / weights)
    }
}

/// Selection weight for a subject with the given answer history.
pub fn weight(records: &[Correctness], config: &SchedulerConfig) -> f64 {
    match mastery(records, config.window) {
        None => config.unseen_weight,
        Some(m) => config.min_weight + (1.0 - m) * (config.max_weight - config.min_weight),
    }
}

/// Weighted sampling without replacement.
///
/// Returns up to `count` distinct indices. Zero, negative, and non-finite
/// weights are never picked.
pub fn sample_weighted<R: Rng + ?Sized>(weights: &[f64], count: usize, rng: &mut R) -> Vec<usize> {
    let cleaned: Vec<f64> = weights
        .iter()
        .map(|&w| if w.is_finite() && w > 0.0 { w } else { 0.0 })
        .collect();
    let picks = count.min(cleaned.iter().filter(|&&w| w > 0.0).count());

    let mut out = Vec::with_capacity(picks);
    if picks == 0 {
        return out;
    }
    let Ok(mut dist) = WeightedIndex::new(&cleaned) else {
        return out;
    };

    for n in 0..picks {
        let i = dist.sample(rng);
        out.push(i);
        if n + 1 < picks && dist.update_weights(&[(i, &0.0)]).is_err() {
            break;
        }
    }
    out
}

/// RNG for a session: reproducible with a seed, random otherwise.
pub fn seeded_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// A subject with its current weight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleEntry {
    pub subject: Subject,
    /// Display label (word text or paragraph excerpt).
    pub label: String,
    pub weight: f64,
    pub mastery: Option<f64>,
    pub attempts: usize,
}

/// Weights for every schedulable subject in a deck.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Schedule {
    pub entries: Vec<ScheduleEntry>,
}

impl Schedule {
    /// Weights for each word in the deck.
    pub fn for_words(deck: &Deck, history: &History, config: &SchedulerConfig) -> Self {
        let by_subject = history.by_subject();
        let entries = deck
            .words
            .iter()
            .map(|w| {
                let subject = Subject::word(w.id);
                let records = by_subject.get(&subject).map(Vec::as_slice).unwrap_or(&[]);
                entry(subject, w.text.clone(), records, config)
            })
            .collect();
        Self { entries }
    }

    /// Weights for each paragraph that has a meaning.
    pub fn for_paragraphs(deck: &Deck, history: &History, config: &SchedulerConfig) -> Self {
        let by_subject = history.by_subject();
        let mut entries = Vec::new();
        for article in &deck.articles {
            for (index, p) in article.paragraphs.iter().enumerate() {
                if !p.has_meaning() {
                    continue;
                }
                let subject = Subject::paragraph(article.id, index);
                let records = by_subject.get(&subject).map(Vec::as_slice).unwrap_or(&[]);
                let label = format!("{} #{}: {}", article.title, index + 1, excerpt(&p.text, 24));
                entries.push(entry(subject, label, records, config));
            }
        }
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Draw up to `count` distinct entries by weight.
    pub fn sample<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<&ScheduleEntry> {
        let weights: Vec<f64> = self.entries.iter().map(|e| e.weight).collect();
        sample_weighted(&weights, count, rng)
            .into_iter()
            .map(|i| &self.entries[i])
            .collect()
    }
}

fn entry(
    subject: Subject,
    label: String,
    records: &[Correctness],
    config: &SchedulerConfig,
) -> ScheduleEntry {
    ScheduleEntry {
        subject,
        label,
        weight: weight(records, config),
        mastery: mastery(records, config.window),
        attempts: records.len(),
    }
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() <= max_chars {
        line.to_string()
    } else {
        let cut: String = line.chars().take(max_chars).collect();
        format!("{cut}…")
    }
}
