//! The `vocadrill init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("vocadrill.toml").exists() {
        println!("vocadrill.toml already exists, skipping.");
    } else {
        std::fs::write("vocadrill.toml", SAMPLE_CONFIG)?;
        println!("Created vocadrill.toml");
    }

    std::fs::create_dir_all("decks")?;
    let example_path = std::path::Path::new("decks/example.toml");
    if example_path.exists() {
        println!("decks/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_DECK)?;
        println!("Created decks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: vocadrill validate --deck decks/example.toml");
    println!("  2. Run: vocadrill practice --deck decks/example.toml");
    println!("  3. Run: vocadrill stats --deck decks/example.toml");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# vocadrill configuration

history_path = "./vocadrill-data/history.json"
output_dir = "./vocadrill-data/sessions"

# Translators are tried in this order when filling in paragraph meanings.
translator_order = ["glossary"]
max_retries = 2
retry_delay_ms = 500
parallelism = 4

[translators.glossary]
type = "glossary"
min_coverage = 0.5

# Any program that reads text on stdin and prints a translation.
# [translators.local]
# type = "command"
# program = "my-translate"
# args = ["--from", "{source}", "--to", "{target}"]
# env = { API_KEY = "${MY_TRANSLATE_KEY}" }
# timeout_secs = 30

[grading]
partial_threshold = 0.5
fold_accents = true

[scheduler]
window = 5
unseen_weight = 3.0
min_weight = 0.5
max_weight = 4.0

[producer]
choice_count = 4
kinds = ["selection", "filling", "reordering", "accent", "context", "reading", "translation"]
"#;

const EXAMPLE_DECK: &str = r#"[deck]
id = "example"
name = "Example Deck"
description = "A few Japanese words to get started"
language = "ja"
native_language = "en"

[[words]]
text = "雨"
meaning = "rain"
reading = "あめ"
tokens = ["あ", "め"]
accent = 1
tags = ["weather"]

[[words]]
text = "猫"
meaning = "cat; kitty"
reading = "ねこ"
tokens = ["ね", "こ"]
accent = 1
tags = ["animals"]

[[words]]
text = "今日"
meaning = "today"
reading = "きょう"
tokens = ["きょ", "う"]
accent = 1

[[words]]
text = "魚"
meaning = "fish"
reading = "さかな"
tokens = ["さ", "か", "な"]
accent = 0
tags = ["animals"]

[[articles]]
title = "A rainy day"
text = """
今日は雨です。

猫が魚を食べています。
"""
meaning = """
It is raining today.

The cat is eating fish.
"""
"#;
