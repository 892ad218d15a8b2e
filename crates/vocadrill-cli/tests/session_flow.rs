//! End-to-end practice sessions: answers on stdin, history and reports on disk.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn vocadrill() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("vocadrill").unwrap();
    cmd.env_remove("VOCADRILL_HISTORY");
    cmd
}

fn deck_path(name: &str) -> PathBuf {
    std::fs::canonicalize(format!("../../decks/{name}")).unwrap()
}

fn practice(dir: &Path, kinds: &str, seed: &str, stdin: &str) -> assert_cmd::assert::Assert {
    vocadrill()
        .current_dir(dir)
        .arg("practice")
        .arg("--deck")
        .arg(deck_path("ja-weather.toml"))
        .args(["--count", "4", "--kinds", kinds, "--seed", seed])
        .arg("--history")
        .arg(dir.join("history.json"))
        .arg("--output")
        .arg(dir.join("sessions"))
        .write_stdin(stdin)
        .assert()
}

fn history_len(dir: &Path) -> usize {
    let content = std::fs::read_to_string(dir.join("history.json")).unwrap();
    let history: serde_json::Value = serde_json::from_str(&content).unwrap();
    history["records"].as_array().unwrap().len()
}

fn reports(dir: &Path) -> Vec<serde_json::Value> {
    let mut reports = Vec::new();
    for entry in std::fs::read_dir(dir.join("sessions")).unwrap() {
        let content = std::fs::read_to_string(entry.unwrap().path()).unwrap();
        reports.push(serde_json::from_str(&content).unwrap());
    }
    reports
}

#[test]
fn answered_session_is_recorded() {
    let dir = TempDir::new().unwrap();

    practice(dir.path(), "filling", "7", "x\nx\nx\nx\n")
        .success()
        .stdout(predicate::str::contains("(1/4) [filling] Type the word"))
        .stdout(predicate::str::contains("(4/4)"))
        .stdout(predicate::str::contains("incorrect"))
        .stderr(predicate::str::contains("Answered 4 (0 skipped)"))
        .stderr(predicate::str::contains("Session saved to"));

    assert_eq!(history_len(dir.path()), 4);
    let reports = reports(dir.path());
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["outcomes"].as_array().unwrap().len(), 4);
    assert_eq!(reports[0]["deck"]["id"], "ja-weather");
    assert_eq!(reports[0]["stats"]["per_kind"]["filling"]["incorrect"], 4);
}

#[test]
fn quitting_keeps_earlier_answers() {
    let dir = TempDir::new().unwrap();

    practice(dir.path(), "filling", "7", "x\n\nq\n")
        .success()
        .stdout(predicate::str::contains("skipped, answer:"))
        .stdout(predicate::str::contains("(4/4)").not())
        .stderr(predicate::str::contains("Answered 1 (3 skipped)"));

    assert_eq!(history_len(dir.path()), 1);
    assert_eq!(reports(dir.path())[0]["skipped"], 3);
}

#[test]
fn same_seed_asks_the_same_questions() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();

    let prompts = |dir: &Path| {
        let output = practice(dir, "selection,reordering,accent", "11", "q\n")
            .success()
            .get_output()
            .stdout
            .clone();
        String::from_utf8(output).unwrap()
    };
    assert_eq!(prompts(first.path()), prompts(second.path()));
}

#[test]
fn history_feeds_stats() {
    let dir = TempDir::new().unwrap();
    practice(dir.path(), "reading", "3", "It is raining today.\n\n\n\n").success();

    vocadrill()
        .current_dir(dir.path())
        .arg("stats")
        .arg("--deck")
        .arg(deck_path("ja-weather.toml"))
        .arg("--history")
        .arg(dir.path().join("history.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Deck: Japanese: weather (1 answers)"))
        .stdout(predicate::str::contains("reading"))
        .stdout(predicate::str::contains("Weakest:"))
        .stdout(predicate::str::contains("Forecast #"));
}

#[test]
fn short_deck_logs_fewer_practices() {
    let dir = TempDir::new().unwrap();

    vocadrill()
        .current_dir(dir.path())
        .arg("practice")
        .arg("--deck")
        .arg(deck_path("ja-weather.toml"))
        .args(["--count", "20", "--kinds", "filling", "--seed", "5"])
        .arg("--history")
        .arg(dir.path().join("history.json"))
        .arg("--output")
        .arg(dir.path().join("sessions"))
        .write_stdin("q\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("6 practice(s)"))
        .stderr(predicate::str::contains("fewer practices than requested"))
        .stderr(predicate::str::contains("history saved"));
}

#[test]
fn unknown_kind_is_rejected() {
    let dir = TempDir::new().unwrap();
    practice(dir.path(), "essay", "1", "")
        .failure()
        .stderr(predicate::str::contains("unknown practice kind: essay"));
}

#[test]
fn translate_fills_missing_meanings_with_the_glossary() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("de-basics.toml");

    vocadrill()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .arg("translate")
        .arg("--deck")
        .arg(deck_path("de-basics.toml"))
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Filled 1 of 1 paragraph(s)"))
        .stderr(predicate::str::contains("via glossary"));

    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.contains("the cat plays"));

    vocadrill()
        .current_dir(dir.path())
        .arg("validate")
        .arg("--deck")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("All decks valid"));
}
