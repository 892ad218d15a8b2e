//! Accuracy statistics for sessions and answer history.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::grading::Correctness;
use crate::history::History;
use crate::model::Deck;
use crate::practice::{PracticeKindTag, Subject};
use crate::scheduler::{mastery, SchedulerConfig};

/// Counts for one group of answers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KindStats {
    pub total: usize,
    pub correct: usize,
    pub partial: usize,
    pub incorrect: usize,
    /// Mean correctness score (partial counts half).
    pub accuracy: f64,
}

impl KindStats {
    fn add(&mut self, c: Correctness) {
        self.total += 1;
        match c {
            Correctness::Correct => self.correct += 1,
            Correctness::PartiallyCorrect => self.partial += 1,
            Correctness::Incorrect => self.incorrect += 1,
        }
        self.accuracy = (self.correct as f64 + 0.5 * self.partial as f64) / self.total as f64;
    }
}

/// Totals plus a per-kind breakdown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total: usize,
    pub correct: usize,
    pub partial: usize,
    pub incorrect: usize,
    pub accuracy: f64,
    pub per_kind: BTreeMap<PracticeKindTag, KindStats>,
}

impl SessionStats {
    /// Tally `(kind, correctness)` pairs.
    pub fn from_answers<I>(answers: I) -> Self
    where
        I: IntoIterator<Item = (PracticeKindTag, Correctness)>,
    {
        let mut overall = KindStats::default();
        let mut per_kind: BTreeMap<PracticeKindTag, KindStats> = BTreeMap::new();
        for (kind, c) in answers {
            overall.add(c);
            per_kind.entry(kind).or_default().add(c);
        }
        Self {
            total: overall.total,
            correct: overall.correct,
            partial: overall.partial,
            incorrect: overall.incorrect,
            accuracy: overall.accuracy,
            per_kind,
        }
    }
}

/// How well one subject is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectMastery {
    pub subject: Subject,
    pub label: String,
    pub attempts: usize,
    pub mastery: f64,
    pub last: Correctness,
}

/// Statistics over the whole history of one deck.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryStats {
    pub overall: SessionStats,
    /// Practiced subjects, weakest first.
    pub subjects: Vec<SubjectMastery>,
}

impl HistoryStats {
    /// The `n` weakest subjects.
    pub fn weakest(&self, n: usize) -> &[SubjectMastery] {
        &self.subjects[..n.min(self.subjects.len())]
    }
}

/// Compute statistics for the subjects of `deck` found in `history`.
///
/// Records about subjects outside the deck are ignored, so one history file
/// can serve several decks.
pub fn history_stats(history: &History, deck: &Deck, config: &SchedulerConfig) -> HistoryStats {
    let labels = subject_labels(deck);

    let overall = SessionStats::from_answers(
        history
            .records
            .iter()
            .filter(|r| labels.contains_key(&r.subject))
            .map(|r| (r.kind, r.correctness)),
    );

    let mut subjects: Vec<SubjectMastery> = history
        .by_subject()
        .into_iter()
        .filter_map(|(subject, records)| {
            let label = labels.get(&subject)?;
            let last = *records.last()?;
            Some(SubjectMastery {
                subject,
                label: label.clone(),
                attempts: records.len(),
                mastery: mastery(&records, config.window)?,
                last,
            })
        })
        .collect();
    subjects.sort_by(|a, b| {
        a.mastery
            .total_cmp(&b.mastery)
            .then_with(|| b.attempts.cmp(&a.attempts))
            .then_with(|| a.label.cmp(&b.label))
    });

    HistoryStats { overall, subjects }
}

fn subject_labels(deck: &Deck) -> BTreeMap<Subject, String> {
    let mut labels = BTreeMap::new();
    for w in &deck.words {
        labels.insert(Subject::word(w.id), w.text.clone());
    }
    for a in &deck.articles {
        for index in 0..a.paragraphs.len() {
            labels.insert(
                Subject::paragraph(a.id, index),
                format!("{} #{}", a.title, index + 1),
            );
        }
    }
    labels
}
