//! The `vocadrill compare` command.

use std::path::PathBuf;

use anyhow::Result;

use vocadrill_core::report::{KindChange, SessionReport};

use super::percent;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: f64,
    fail_on_decline: bool,
    format: String,
) -> Result<()> {
    let baseline = SessionReport::load_json(&baseline_path)?;
    let current = SessionReport::load_json(&current_path)?;

    if baseline.deck.id != current.deck.id {
        eprintln!(
            "Warning: comparing sessions of different decks ({} vs {})",
            baseline.deck.id, current.deck.id
        );
    }

    let report = current.compare(&baseline, threshold);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            println!(
                "Comparison: overall {:+.1}%, {} declines, {} improvements, {} unchanged",
                report.overall_delta * 100.0,
                report.declines.len(),
                report.improvements.len(),
                report.unchanged
            );
            print_changes("Declines", &report.declines);
            print_changes("Improvements", &report.improvements);

            if !report.new_kinds.is_empty() {
                println!("\n{} new kind(s)", report.new_kinds.len());
            }
            if !report.missing_kinds.is_empty() {
                println!("{} missing kind(s)", report.missing_kinds.len());
            }
        }
    }

    if fail_on_decline && report.has_declines() {
        std::process::exit(1);
    }

    Ok(())
}

fn print_changes(title: &str, changes: &[KindChange]) {
    if changes.is_empty() {
        return;
    }
    println!("\n{title}:");
    for c in changes {
        println!(
            "  {} {} -> {} ({:+.1}%)",
            c.kind,
            percent(c.baseline_accuracy),
            percent(c.current_accuracy),
            c.delta * 100.0
        );
    }
}
