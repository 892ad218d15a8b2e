//! The `vocadrill schedule` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use vocadrill_core::history::History;
use vocadrill_core::parser;
use vocadrill_core::scheduler::{seeded_rng, Schedule};
use vocadrill_providers::config::load_config_from;

use super::{history_path, percent};

pub fn execute(
    deck_path: PathBuf,
    count: usize,
    seed: Option<u64>,
    history: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(count >= 1, "count must be at least 1");

    let config = load_config_from(config_path.as_deref())?;
    let deck = parser::parse_deck(&deck_path)?;
    let history = History::load_or_default(&history_path(history, &config))?;

    let mut schedule = Schedule::for_words(&deck, &history, &config.scheduler);
    schedule
        .entries
        .extend(Schedule::for_paragraphs(&deck, &history, &config.scheduler).entries);
    anyhow::ensure!(!schedule.is_empty(), "deck '{}' has nothing to practice", deck.id);

    let total_weight: f64 = schedule.entries.iter().map(|e| e.weight).sum();
    let mut rng = seeded_rng(seed);
    let picks = schedule.sample(count, &mut rng);

    println!(
        "Next {} of {} subject(s) in {}:",
        picks.len(),
        schedule.entries.len(),
        deck.name
    );

    let mut table = Table::new();
    table.set_header(vec!["#", "Subject", "Weight", "Chance", "Mastery", "Attempts"]);
    for (i, entry) in picks.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&entry.label),
            Cell::new(format!("{:.2}", entry.weight)),
            Cell::new(percent(entry.weight / total_weight)),
            Cell::new(entry.mastery.map(percent).unwrap_or_else(|| "new".to_string())),
            Cell::new(entry.attempts),
        ]);
    }
    println!("{table}");

    Ok(())
}
