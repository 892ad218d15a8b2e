//! The `vocadrill stats` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use vocadrill_core::history::History;
use vocadrill_core::parser;
use vocadrill_core::statistics::{history_stats, HistoryStats};
use vocadrill_providers::config::load_config_from;

use super::{history_path, kind_table, percent};

pub fn execute(
    deck_path: PathBuf,
    limit: usize,
    history: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let decks = parser::load_decks(&deck_path)?;
    let history = History::load_or_default(&history_path(history, &config))?;

    for deck in &decks {
        let stats = history_stats(&history, deck, &config.scheduler);
        println!("Deck: {} ({} answers)", deck.name, stats.overall.total);
        if stats.overall.total == 0 {
            println!("  No answers yet.\n");
            continue;
        }
        print_stats(&stats, limit);
    }

    Ok(())
}

fn print_stats(stats: &HistoryStats, limit: usize) {
    let overall = &stats.overall;
    println!(
        "  Accuracy {} ({} correct, {} partial, {} incorrect)",
        percent(overall.accuracy),
        overall.correct,
        overall.partial,
        overall.incorrect
    );

    println!("{}", kind_table(overall));

    let weakest = stats.weakest(limit);
    if weakest.is_empty() {
        return;
    }
    let mut subjects = Table::new();
    subjects.set_header(vec!["Subject", "Mastery", "Attempts", "Last"]);
    for s in weakest {
        subjects.add_row(vec![
            Cell::new(&s.label),
            Cell::new(percent(s.mastery)),
            Cell::new(s.attempts),
            Cell::new(s.last),
        ]);
    }
    println!("Weakest:\n{subjects}\n");
}
