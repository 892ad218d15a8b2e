//! Answer history with JSON persistence.
//!
//! The scheduler reads past correctness from here to weight what comes next.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::grading::Correctness;
use crate::practice::{PracticeKindTag, Subject};

/// One graded answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub subject: Subject,
    pub kind: PracticeKindTag,
    pub correctness: Correctness,
    pub answered_at: DateTime<Utc>,
    pub session_id: Uuid,
}

/// All recorded answers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    #[serde(default)]
    pub records: Vec<AnswerRecord>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: AnswerRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Correctness of every answer about `subject`, oldest first.
    pub fn records_for(&self, subject: &Subject) -> Vec<Correctness> {
        let mut records: Vec<&AnswerRecord> = self
            .records
            .iter()
            .filter(|r| &r.subject == subject)
            .collect();
        records.sort_by_key(|r| r.answered_at);
        records.into_iter().map(|r| r.correctness).collect()
    }

    /// Correctness grouped by subject, each list oldest first.
    pub fn by_subject(&self) -> HashMap<Subject, Vec<Correctness>> {
        let mut sorted: Vec<&AnswerRecord> = self.records.iter().collect();
        sorted.sort_by_key(|r| r.answered_at);

        let mut map: HashMap<Subject, Vec<Correctness>> = HashMap::new();
        for r in sorted {
            map.entry(r.subject).or_default().push(r.correctness);
        }
        map
    }

    /// Save the history as JSON.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize history")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write history to {}", path.display()))?;
        Ok(())
    }

    /// Load a history from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read history from {}", path.display()))?;
        let history: History =
            serde_json::from_str(&content).context("failed to parse history JSON")?;
        Ok(history)
    }

    /// Load a history, treating a missing file as empty.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_json(path)
        } else {
            tracing::debug!("no history at {}, starting fresh", path.display());
            Ok(Self::default())
        }
    }
}
