//! The `vocadrill grade` command.

use std::path::PathBuf;

use anyhow::Result;

use vocadrill_core::grading::grade_text;
use vocadrill_providers::config::load_config_from;

use super::percent;

pub fn execute(
    keys: Vec<String>,
    answer: String,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    let keys: Vec<&str> = keys
        .iter()
        .flat_map(|k| k.split(';'))
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .collect();
    anyhow::ensure!(!keys.is_empty(), "at least one non-empty key is required");

    let grade = grade_text(&answer, &keys, &config.grading);

    match format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&grade)?);
        }
        _ => {
            println!("Result: {} (overlap {})", grade.correctness, percent(grade.overlap));
            println!("Key: {}", grade.key);
            if !grade.matched.is_empty() {
                println!("Matched: {}", grade.matched.join(", "));
            }
            if !grade.missing.is_empty() {
                println!("Missing: {}", grade.missing.join(", "));
            }
            if !grade.extra.is_empty() {
                println!("Extra: {}", grade.extra.join(", "));
            }
        }
    }

    Ok(())
}
