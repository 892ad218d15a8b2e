//! The `vocadrill practice` command.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;

use vocadrill_core::history::History;
use vocadrill_core::parser;
use vocadrill_core::practice::{Answer, Practice, PracticeKind, PracticeKindTag, SelectionDirection};
use vocadrill_core::producer::produce_session;
use vocadrill_core::report::SessionReport;
use vocadrill_core::scheduler::seeded_rng;
use vocadrill_core::session::PracticeSession;
use vocadrill_providers::config::load_config_from;

use super::{history_path, kind_table, percent};

#[allow(clippy::too_many_arguments)]
pub fn execute(
    deck_path: PathBuf,
    count: usize,
    kinds: Option<String>,
    seed: Option<u64>,
    history: Option<PathBuf>,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(count >= 1, "count must be at least 1");

    let mut config = load_config_from(config_path.as_deref())?;
    if let Some(kinds) = &kinds {
        config.producer.kinds = parse_kinds(kinds)?;
    }

    let deck = parser::parse_deck(&deck_path)?;
    let history_path = history_path(history, &config);
    let mut history = History::load_or_default(&history_path)?;
    tracing::debug!(
        path = %history_path.display(),
        records = history.records.len(),
        "history loaded"
    );

    let (practices, _) = produce_session(
        &deck,
        &history,
        &config.scheduler,
        &config.producer,
        count,
        seeded_rng(seed),
    );
    anyhow::ensure!(
        !practices.is_empty(),
        "nothing to practice in deck '{}' with the selected kinds",
        deck.id
    );
    if practices.len() < count {
        tracing::warn!(
            requested = count,
            produced = practices.len(),
            "fewer practices than requested"
        );
    }

    eprintln!(
        "vocadrill v{}: {} practice(s) from {}. Enter to skip, q to stop.",
        env!("CARGO_PKG_VERSION"),
        practices.len(),
        deck.name
    );

    let mut session = PracticeSession::new(deck.summary(), practices, config.grading.clone());
    run_session(&mut session, io::stdin().lock(), io::stdout().lock())?;

    let report = session.finish(&mut history);
    history.save_json(&history_path)?;
    tracing::info!(path = %history_path.display(), "history saved");
    print_summary(&report);

    let output = output.unwrap_or_else(|| config.output_dir.clone());
    let path = output.join(report.file_name());
    report.save_json(&path)?;
    eprintln!("Session saved to: {}", path.display());

    Ok(())
}

fn parse_kinds(s: &str) -> Result<Vec<PracticeKindTag>> {
    let kinds = s
        .split(',')
        .filter(|k| !k.trim().is_empty())
        .map(|k| k.parse::<PracticeKindTag>().map_err(anyhow::Error::msg))
        .collect::<Result<Vec<_>>>()?;
    anyhow::ensure!(!kinds.is_empty(), "at least one practice kind is required");
    Ok(kinds)
}

/// Ask each practice in turn, reading one answer per line.
///
/// An empty line skips the practice, `q` or end of input stops the session,
/// and unparseable input asks again.
fn run_session<R: BufRead, W: Write>(
    session: &mut PracticeSession,
    input: R,
    mut out: W,
) -> Result<()> {
    let practices: Vec<Practice> = session.practices().to_vec();
    let total = practices.len();
    let mut lines = input.lines();

    'practices: for (i, practice) in practices.iter().enumerate() {
        writeln!(out, "\n({}/{total}) {}", i + 1, render(practice))?;
        loop {
            write!(out, "> ")?;
            out.flush()?;

            let Some(line) = lines.next() else {
                break 'practices;
            };
            let line = line?;
            let input = line.trim();
            if input.eq_ignore_ascii_case("q") {
                break 'practices;
            }
            if input.is_empty() {
                writeln!(out, "  skipped, answer: {}", practice.expected())?;
                continue 'practices;
            }

            let outcome = Answer::parse_for(&practice.kind, input)
                .and_then(|answer| session.answer(practice.id, &answer));
            match outcome {
                Ok(outcome) => {
                    if outcome.correctness.is_correct() {
                        writeln!(out, "  {}", outcome.correctness)?;
                    } else {
                        writeln!(
                            out,
                            "  {} (overlap {}), answer: {}",
                            outcome.correctness,
                            percent(outcome.overlap),
                            outcome.expected
                        )?;
                    }
                    continue 'practices;
                }
                Err(e) => writeln!(out, "  {e}, try again")?,
            }
        }
    }

    Ok(())
}

/// Console rendering of a practice: instruction, prompt, and choices.
fn render(practice: &Practice) -> String {
    let instruction = match &practice.kind {
        PracticeKind::Selection {
            direction: SelectionDirection::TextToMeaning,
            ..
        } => "Choose the meaning",
        PracticeKind::Selection {
            direction: SelectionDirection::MeaningToText,
            ..
        } => "Choose the word",
        PracticeKind::Filling { .. } => "Type the word",
        PracticeKind::Reordering { .. } => "Put the pieces in order",
        PracticeKind::Accent { .. } => "Where does the pitch drop?",
        PracticeKind::Context { .. } => "Fill in the blank",
        PracticeKind::Reading { .. } => "Translate",
        PracticeKind::Translation { .. } => "Write in the studied language",
    };

    let mut s = format!("[{}] {instruction}\n  {}", practice.tag(), practice.prompt);
    match &practice.kind {
        PracticeKind::Selection { options, .. } | PracticeKind::Accent { options, .. } => {
            for (i, option) in options.iter().enumerate() {
                s.push_str(&format!("\n  {}. {option}", i + 1));
            }
        }
        PracticeKind::Filling { hint, .. } => s.push_str(&format!("\n  hint: {hint}")),
        PracticeKind::Reordering { pieces, .. } => {
            let numbered: Vec<String> = pieces
                .iter()
                .enumerate()
                .map(|(i, p)| format!("{}:{p}", i + 1))
                .collect();
            s.push_str(&format!("\n  {}", numbered.join("  ")));
        }
        _ => {}
    }
    s
}

fn print_summary(report: &SessionReport) {
    let stats = &report.stats;
    eprintln!(
        "\nAnswered {} ({} skipped): {} correct, {} partial, {} incorrect, accuracy {}",
        stats.total,
        report.skipped,
        stats.correct,
        stats.partial,
        stats.incorrect,
        percent(stats.accuracy)
    );
    if stats.total > 0 {
        eprintln!("{}", kind_table(stats));
    }
}
