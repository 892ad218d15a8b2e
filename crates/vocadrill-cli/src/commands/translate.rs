//! The `vocadrill translate` command.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use vocadrill_core::engine::{ProgressReporter, TranslationEngine};
use vocadrill_core::parser;
use vocadrill_providers::build_translators;
use vocadrill_providers::config::load_config_from;

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_paragraph_start(&self, article: &str, index: usize) {
        eprintln!("  Translating: {article} #{}", index + 1);
    }

    fn on_paragraph_done(&self, article: &str, index: usize, translator: &str) {
        eprintln!("  Done: {article} #{} via {translator}", index + 1);
    }

    fn on_paragraph_error(&self, article: &str, index: usize, error: &str) {
        eprintln!("  ERROR: {article} #{}: {error}", index + 1);
    }

    fn on_complete(&self, filled: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {filled} filled, {failed} failed ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(
    deck_path: PathBuf,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    anyhow::ensure!(config.parallelism >= 1, "parallelism must be at least 1");

    let mut deck = parser::parse_deck(&deck_path)?;
    let missing: usize = deck
        .articles
        .iter()
        .map(|a| {
            a.paragraphs
                .iter()
                .filter(|p| !p.has_meaning() && !p.text.trim().is_empty())
                .count()
        })
        .sum();
    if missing == 0 {
        println!("All paragraphs in {} already have meanings.", deck.name);
        return Ok(());
    }

    let translators = build_translators(&config, &deck)?;
    let engine = TranslationEngine::new(translators, config.engine_config());
    eprintln!(
        "Translating {missing} paragraph(s) {}→{} with: {}",
        deck.language,
        deck.native_language,
        engine.translator_names().join(", ")
    );

    let summary = engine
        .fill_missing_meanings(&mut deck, &ConsoleReporter)
        .await?;

    let output = output.unwrap_or(deck_path);
    if summary.filled > 0 {
        parser::write_deck(&deck, &output)?;
        println!(
            "Filled {} of {missing} paragraph(s), saved to: {}",
            summary.filled,
            output.display()
        );
    } else {
        println!("No paragraphs could be translated.");
    }

    Ok(())
}
