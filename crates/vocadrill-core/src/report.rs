//! Session reports with JSON persistence and progress comparison.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::DeckSummary;
use crate::practice::PracticeKindTag;
use crate::session::Outcome;
use crate::statistics::SessionStats;

/// A finished practice session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Session identifier, also stored on each history record.
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// The deck that was practiced.
    pub deck: DeckSummary,
    /// Graded answers in the order given.
    pub outcomes: Vec<Outcome>,
    /// Practices left unanswered.
    #[serde(default)]
    pub skipped: usize,
    pub stats: SessionStats,
}

impl SessionReport {
    /// File name used when saving into an output directory.
    pub fn file_name(&self) -> String {
        format!("session-{}.json", self.started_at.format("%Y%m%d-%H%M%S"))
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: SessionReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Compare per-kind accuracy against an earlier session.
    ///
    /// Changes within `threshold` count as unchanged.
    pub fn compare(&self, baseline: &SessionReport, threshold: f64) -> ProgressReport {
        let mut declines = Vec::new();
        let mut improvements = Vec::new();
        let mut unchanged = 0usize;
        let mut new_kinds = Vec::new();

        for (kind, current) in &self.stats.per_kind {
            let Some(before) = baseline.stats.per_kind.get(kind) else {
                new_kinds.push(*kind);
                continue;
            };
            let change = KindChange {
                kind: *kind,
                baseline_accuracy: before.accuracy,
                current_accuracy: current.accuracy,
                delta: current.accuracy - before.accuracy,
            };
            if change.delta < -threshold {
                declines.push(change);
            } else if change.delta > threshold {
                improvements.push(change);
            } else {
                unchanged += 1;
            }
        }

        let current: BTreeSet<&PracticeKindTag> = self.stats.per_kind.keys().collect();
        let missing_kinds = baseline
            .stats
            .per_kind
            .keys()
            .filter(|k| !current.contains(k))
            .copied()
            .collect();

        ProgressReport {
            overall_delta: self.stats.accuracy - baseline.stats.accuracy,
            declines,
            improvements,
            unchanged,
            new_kinds,
            missing_kinds,
        }
    }
}

/// Accuracy change for one practice kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindChange {
    pub kind: PracticeKindTag,
    pub baseline_accuracy: f64,
    pub current_accuracy: f64,
    pub delta: f64,
}

/// Result of comparing two session reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressReport {
    pub overall_delta: f64,
    /// Kinds whose accuracy went down.
    pub declines: Vec<KindChange>,
    /// Kinds whose accuracy went up.
    pub improvements: Vec<KindChange>,
    pub unchanged: usize,
    /// Kinds practiced now but not in the baseline.
    pub new_kinds: Vec<PracticeKindTag>,
    /// Kinds practiced in the baseline but not now.
    pub missing_kinds: Vec<PracticeKindTag>,
}

impl ProgressReport {
    pub fn has_declines(&self) -> bool {
        !self.declines.is_empty()
    }

    /// Format the comparison as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        md.push_str(&format!(
            "**Summary:** overall {:+.1}%, {} declined, {} improved, {} unchanged\n\n",
            self.overall_delta * 100.0,
            self.declines.len(),
            self.improvements.len(),
            self.unchanged
        ));

        for (title, changes) in [("Declines", &self.declines), ("Improvements", &self.improvements)] {
            if changes.is_empty() {
                continue;
            }
            md.push_str(&format!("### {title}\n\n"));
            md.push_str("| Kind | Baseline | Current | Delta |\n");
            md.push_str("|------|----------|---------|-------|\n");
            for c in changes {
                md.push_str(&format!(
                    "| {} | {:.1}% | {:.1}% | {:+.1}% |\n",
                    c.kind,
                    c.baseline_accuracy * 100.0,
                    c.current_accuracy * 100.0,
                    c.delta * 100.0
                ));
            }
            md.push('\n');
        }
        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::Correctness::{self, *};
    use PracticeKindTag::*;

    fn report(answers: &[(PracticeKindTag, Correctness)]) -> SessionReport {
        SessionReport {
            id: Uuid::nil(),
            started_at: DateTime::from_timestamp(0, 0).unwrap(),
            finished_at: DateTime::from_timestamp(60, 0).unwrap(),
            deck: DeckSummary {
                id: "d".into(),
                name: "D".into(),
                word_count: 0,
                article_count: 0,
            },
            outcomes: vec![],
            skipped: 0,
            stats: SessionStats::from_answers(answers.iter().copied()),
        }
    }

    #[test]
    fn compare_detects_changes() {
        let baseline = report(&[
            (Selection, Correct),
            (Filling, Incorrect),
            (Accent, Correct),
            (Reading, Correct),
        ]);
        let current = report(&[
            (Selection, Incorrect),
            (Filling, Correct),
            (Accent, Correct),
            (Context, Correct),
        ]);

        let progress = current.compare(&baseline, 0.05);
        assert_eq!(progress.declines.len(), 1);
        assert_eq!(progress.declines[0].kind, Selection);
        assert_eq!(progress.improvements[0].kind, Filling);
        assert_eq!(progress.unchanged, 1);
        assert_eq!(progress.new_kinds, vec![Context]);
        assert_eq!(progress.missing_kinds, vec![Reading]);
        assert!(progress.has_declines());

        let md = progress.to_markdown();
        assert!(md.contains("### Declines"));
        assert!(md.contains("| selection | 100.0% | 0.0% | -100.0% |"));
    }

    #[test]
    fn identical_reports_are_unchanged() {
        let r = report(&[(Selection, Correct), (Filling, PartiallyCorrect)]);
        let progress = r.compare(&r, 0.0);
        assert!(!progress.has_declines());
        assert!(progress.improvements.is_empty());
        assert_eq!(progress.unchanged, 2);
        assert_eq!(progress.overall_delta, 0.0);
    }

    #[test]
    fn json_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let r = report(&[(Selection, Correct)]);
        let path = dir.path().join("out").join(r.file_name());
        r.save_json(&path).unwrap();

        let loaded = SessionReport::load_json(&path).unwrap();
        assert_eq!(loaded.stats, r.stats);
        assert_eq!(r.file_name(), "session-19700101-000000.json");
    }
}
