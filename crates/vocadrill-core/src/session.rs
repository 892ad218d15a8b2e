//! A practice session: a fixed list of practices and the learner's answers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PracticeError;
use crate::grading::{grade_practice, Correctness, GradingConfig};
use crate::history::{AnswerRecord, History};
use crate::model::DeckSummary;
use crate::practice::{Answer, Practice, PracticeKindTag, Subject};
use crate::report::SessionReport;
use crate::statistics::SessionStats;

/// A graded answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub practice_id: Uuid,
    pub subject: Subject,
    pub kind: PracticeKindTag,
    pub prompt: String,
    pub answer: Answer,
    pub correctness: Correctness,
    pub overlap: f64,
    pub expected: String,
    pub answered_at: DateTime<Utc>,
}

/// An in-progress session.
#[derive(Debug, Clone)]
pub struct PracticeSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    deck: DeckSummary,
    practices: Vec<Practice>,
    outcomes: Vec<Outcome>,
    grading: GradingConfig,
}

impl PracticeSession {
    pub fn new(deck: DeckSummary, practices: Vec<Practice>, grading: GradingConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            deck,
            practices,
            outcomes: Vec::new(),
            grading,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn practices(&self) -> &[Practice] {
        &self.practices
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn outcome(&self, practice_id: Uuid) -> Option<&Outcome> {
        self.outcomes.iter().find(|o| o.practice_id == practice_id)
    }

    /// Answer a practice.
    ///
    /// Only the first answer counts: once a practice has an outcome, further
    /// calls return that outcome unchanged, whatever answer they pass.
    pub fn answer(&mut self, practice_id: Uuid, answer: &Answer) -> Result<Outcome, PracticeError> {
        if let Some(existing) = self.outcome(practice_id) {
            tracing::debug!(%practice_id, "practice already answered");
            return Ok(existing.clone());
        }

        let practice = self
            .practices
            .iter()
            .find(|p| p.id == practice_id)
            .ok_or(PracticeError::UnknownPractice(practice_id))?;
        let grade = grade_practice(practice, answer, &self.grading)?;

        let outcome = Outcome {
            practice_id,
            subject: practice.subject,
            kind: practice.tag(),
            prompt: practice.prompt.clone(),
            answer: answer.clone(),
            correctness: grade.correctness,
            overlap: grade.overlap,
            expected: grade.expected,
            answered_at: Utc::now(),
        };
        self.outcomes.push(outcome.clone());
        Ok(outcome)
    }

    /// Practices without an answer, in session order.
    pub fn pending(&self) -> Vec<&Practice> {
        self.practices
            .iter()
            .filter(|p| self.outcome(p.id).is_none())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.outcomes.len() == self.practices.len()
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats::from_answers(self.outcomes.iter().map(|o| (o.kind, o.correctness)))
    }

    /// Close the session, appending each answer to `history`.
    pub fn finish(self, history: &mut History) -> SessionReport {
        for o in &self.outcomes {
            history.push(AnswerRecord {
                subject: o.subject,
                kind: o.kind,
                correctness: o.correctness,
                answered_at: o.answered_at,
                session_id: self.id,
            });
        }

        let stats = self.stats();
        let skipped = self.practices.len() - self.outcomes.len();
        tracing::info!(
            session = %self.id,
            answered = self.outcomes.len(),
            skipped,
            accuracy = stats.accuracy,
            "session finished"
        );

        SessionReport {
            id: self.id,
            started_at: self.started_at,
            finished_at: Utc::now(),
            deck: self.deck,
            outcomes: self.outcomes,
            skipped,
            stats,
        }
    }
}
