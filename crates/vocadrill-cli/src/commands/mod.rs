pub mod compare;
pub mod grade;
pub mod init;
pub mod practice;
pub mod schedule;
pub mod stats;
pub mod translate;
pub mod validate;

use std::path::PathBuf;

use comfy_table::{Cell, Table};

use vocadrill_core::statistics::SessionStats;
use vocadrill_providers::VocadrillConfig;

/// The history file to use: the flag if given, else the configured path.
fn history_path(flag: Option<PathBuf>, config: &VocadrillConfig) -> PathBuf {
    flag.unwrap_or_else(|| config.history_path.clone())
}

/// Percentage with one decimal.
fn percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

/// Per-kind breakdown as a table.
fn kind_table(stats: &SessionStats) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Kind", "Answers", "Correct", "Partial", "Incorrect", "Accuracy"]);
    for (kind, k) in &stats.per_kind {
        table.add_row(vec![
            Cell::new(kind),
            Cell::new(k.total),
            Cell::new(k.correct),
            Cell::new(k.partial),
            Cell::new(k.incorrect),
            Cell::new(percent(k.accuracy)),
        ]);
    }
    table
}
