//! The `vocadrill validate` command.

use std::path::PathBuf;

use anyhow::Result;

use vocadrill_core::parser;

pub fn execute(deck_path: PathBuf) -> Result<()> {
    let decks = parser::load_decks(&deck_path)?;

    let mut total_warnings = 0;

    for deck in &decks {
        println!(
            "Deck: {} ({} words, {} articles)",
            deck.name,
            deck.words.len(),
            deck.articles.len()
        );

        let warnings = parser::validate_deck(deck);
        for w in &warnings {
            let prefix = w
                .subject
                .as_ref()
                .map(|s| format!("  [{s}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All decks valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
