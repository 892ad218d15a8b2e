//! Answer grading.
//!
//! Free-text answers are tokenized, normalized, and compared as token sets
//! against each accepted key. The outcome is a ternary [`Correctness`].
//! Grading is a pure function of the practice, the answer, and the config, so
//! re-grading an answer always gives the same classification.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::PracticeError;
use crate::practice::{Answer, Practice, PracticeKind};
use crate::text::{compact, token_set};

/// Ternary classification of a learner's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Correctness {
    Incorrect,
    PartiallyCorrect,
    Correct,
}

impl Correctness {
    /// Numeric score used by the scheduler and statistics.
    pub fn score(self) -> f64 {
        match self {
            Correctness::Correct => 1.0,
            Correctness::PartiallyCorrect => 0.5,
            Correctness::Incorrect => 0.0,
        }
    }

    pub fn is_correct(self) -> bool {
        self == Correctness::Correct
    }
}

impl std::fmt::Display for Correctness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Correctness::Correct => write!(f, "correct"),
            Correctness::PartiallyCorrect => write!(f, "partially correct"),
            Correctness::Incorrect => write!(f, "incorrect"),
        }
    }
}

/// Grading thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingConfig {
    /// Minimum overlap for a partially correct answer.
    #[serde(default = "default_partial_threshold")]
    pub partial_threshold: f64,
    /// Ignore diacritics when comparing text.
    #[serde(default = "default_true")]
    pub fold_accents: bool,
}

fn default_partial_threshold() -> f64 {
    0.5
}

fn default_true() -> bool {
    true
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            partial_threshold: default_partial_threshold(),
            fold_accents: true,
        }
    }
}

/// Detailed result of a free-text comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextGrade {
    pub correctness: Correctness,
    /// Dice coefficient between answer and key tokens (0.0–1.0).
    pub overlap: f64,
    /// The key alternative the answer was judged against.
    pub key: String,
    pub matched: Vec<String>,
    pub missing: Vec<String>,
    pub extra: Vec<String>,
}

/// Grade a free-text answer against one or more accepted keys.
///
/// The best-matching key wins, first by correctness and then by overlap.
pub fn grade_text<S: AsRef<str>>(answer: &str, keys: &[S], config: &GradingConfig) -> TextGrade {
    let answer_tokens = token_set(answer, config.fold_accents);
    let answer_compact = compact(answer, config.fold_accents);

    let mut best: Option<TextGrade> = None;
    for key in keys {
        let key = key.as_ref();
        let grade = grade_against(&answer_tokens, &answer_compact, key, config);
        let better = match &best {
            None => true,
            Some(b) => (grade.correctness, grade.overlap) > (b.correctness, b.overlap),
        };
        if better {
            best = Some(grade);
        }
    }

    best.unwrap_or_else(|| TextGrade {
        correctness: Correctness::Incorrect,
        overlap: 0.0,
        key: String::new(),
        matched: Vec::new(),
        missing: Vec::new(),
        extra: answer_tokens.into_iter().collect(),
    })
}

fn grade_against(
    answer_tokens: &BTreeSet<String>,
    answer_compact: &str,
    key: &str,
    config: &GradingConfig,
) -> TextGrade {
    let key_tokens = token_set(key, config.fold_accents);

    let matched: Vec<String> = answer_tokens.intersection(&key_tokens).cloned().collect();
    let missing: Vec<String> = key_tokens.difference(answer_tokens).cloned().collect();
    let extra: Vec<String> = answer_tokens.difference(&key_tokens).cloned().collect();

    let (correctness, overlap) = if answer_tokens.is_empty() || key_tokens.is_empty() {
        (Correctness::Incorrect, 0.0)
    } else if *answer_tokens == key_tokens || answer_compact == compact(key, config.fold_accents) {
        (Correctness::Correct, 1.0)
    } else {
        let overlap =
            2.0 * matched.len() as f64 / (answer_tokens.len() + key_tokens.len()) as f64;
        if overlap >= config.partial_threshold {
            (Correctness::PartiallyCorrect, overlap)
        } else {
            (Correctness::Incorrect, overlap)
        }
    };

    TextGrade {
        correctness,
        overlap,
        key: key.to_string(),
        matched,
        missing,
        extra,
    }
}

/// Grade a multiple-choice answer.
pub fn grade_choice(selected: usize, answer: usize, len: usize) -> Result<Correctness, PracticeError> {
    if selected >= len {
        return Err(PracticeError::ChoiceOutOfRange {
            index: selected + 1,
            len,
        });
    }
    Ok(if selected == answer {
        Correctness::Correct
    } else {
        Correctness::Incorrect
    })
}

/// Grade a reordering answer.
///
/// `order` lists piece indices in the learner's arrangement. The arranged
/// text is compared with `key`, so identical pieces are interchangeable.
pub fn grade_order(
    order: &[usize],
    pieces: &[String],
    key: &[String],
    config: &GradingConfig,
) -> Result<(Correctness, f64), PracticeError> {
    if order.len() != pieces.len() {
        return Err(PracticeError::InvalidOrder(format!(
            "expected {} pieces, got {}",
            pieces.len(),
            order.len()
        )));
    }
    let mut seen = vec![false; pieces.len()];
    for &i in order {
        if i >= pieces.len() {
            return Err(PracticeError::InvalidOrder(format!("no piece {}", i + 1)));
        }
        if std::mem::replace(&mut seen[i], true) {
            return Err(PracticeError::InvalidOrder(format!(
                "piece {} used twice",
                i + 1
            )));
        }
    }

    let arranged: Vec<&str> = order.iter().map(|&i| pieces[i].as_str()).collect();
    let key: Vec<&str> = key.iter().map(String::as_str).collect();
    if arranged == key {
        return Ok((Correctness::Correct, 1.0));
    }

    let ratio = lcs_len(&arranged, &key) as f64 / key.len().max(1) as f64;
    let correctness = if ratio >= config.partial_threshold {
        Correctness::PartiallyCorrect
    } else {
        Correctness::Incorrect
    };
    Ok((correctness, ratio))
}

fn lcs_len(a: &[&str], b: &[&str]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for x in a {
        for (j, y) in b.iter().enumerate() {
            curr[j + 1] = if x == y {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Result of grading any practice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub correctness: Correctness,
    /// Overlap or order similarity; 1.0/0.0 for choices.
    pub overlap: f64,
    /// What the learner should have answered.
    pub expected: String,
}

/// Grade an answer to a practice.
pub fn grade_practice(
    practice: &Practice,
    answer: &Answer,
    config: &GradingConfig,
) -> Result<Grade, PracticeError> {
    let expected = practice.expected();

    let (correctness, overlap) = match (&practice.kind, answer) {
        (
            PracticeKind::Selection {
                options, answer: a, ..
            }
            | PracticeKind::Accent {
                options, answer: a, ..
            },
            Answer::Choice(selected),
        ) => {
            let c = grade_choice(*selected, *a, options.len())?;
            (c, c.score())
        }
        (
            PracticeKind::Filling { key, .. }
            | PracticeKind::Context { key, .. }
            | PracticeKind::Reading { key }
            | PracticeKind::Translation { key },
            Answer::Text(t),
        ) => {
            let g = grade_text(t, &[key.as_str()], config);
            (g.correctness, g.overlap)
        }
        (PracticeKind::Reordering { pieces, key }, Answer::Order(order)) => {
            grade_order(order, pieces, key, config)?
        }
        (kind, answer) => {
            return Err(PracticeError::AnswerMismatch {
                expected: kind.answer_shape(),
                got: answer.shape(),
            })
        }
    };

    Ok(Grade {
        correctness,
        overlap,
        expected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::practice::{SelectionDirection, Subject};
    use uuid::Uuid;

    fn cfg() -> GradingConfig {
        GradingConfig::default()
    }

    #[test]
    fn exact_and_normalized_answers_are_correct() {
        let g = grade_text("The Cat", &["the cat"], &cfg());
        assert_eq!(g.correctness, Correctness::Correct);
        assert_eq!(g.overlap, 1.0);

        let g = grade_text("  cat!!", &["cat"], &cfg());
        assert_eq!(g.correctness, Correctness::Correct);
    }

    #[test]
    fn word_order_does_not_matter_for_text() {
        let g = grade_text("brown quick", &["quick brown"], &cfg());
        assert_eq!(g.correctness, Correctness::Correct);
    }

    #[test]
    fn accents_folded_by_default() {
        let g = grade_text("cafe", &["café"], &cfg());
        assert_eq!(g.correctness, Correctness::Correct);

        let strict = GradingConfig {
            fold_accents: false,
            ..cfg()
        };
        let g = grade_text("cafe", &["café"], &strict);
        assert_eq!(g.correctness, Correctness::Incorrect);
    }

    #[test]
    fn voiced_kana_is_a_different_answer() {
        let g = grade_text("はな", &["ばな"], &cfg());
        assert_ne!(g.correctness, Correctness::Correct);
        assert!(g.overlap < 1.0);

        let g = grade_text("ハン", &["パン"], &cfg());
        assert_ne!(g.correctness, Correctness::Correct);

        let g = grade_text("かぜ", &["かぜ"], &cfg());
        assert_eq!(g.correctness, Correctness::Correct);
    }

    #[test]
    fn partial_overlap() {
        let g = grade_text("an apple", &["apple"], &cfg());
        assert_eq!(g.correctness, Correctness::PartiallyCorrect);
        assert!((g.overlap - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(g.matched, vec!["apple"]);
        assert_eq!(g.extra, vec!["an"]);
        assert!(g.missing.is_empty());
    }

    #[test]
    fn low_overlap_is_incorrect() {
        let g = grade_text("a big red dog runs", &["the cat sleeps"], &cfg());
        assert_eq!(g.correctness, Correctness::Incorrect);
    }

    #[test]
    fn empty_answer_or_key_is_incorrect() {
        assert_eq!(
            grade_text("", &["cat"], &cfg()).correctness,
            Correctness::Incorrect
        );
        assert_eq!(
            grade_text("cat", &["!!"], &cfg()).correctness,
            Correctness::Incorrect
        );
        let no_keys: [&str; 0] = [];
        assert_eq!(
            grade_text("cat", &no_keys, &cfg()).correctness,
            Correctness::Incorrect
        );
    }

    #[test]
    fn best_alternative_wins() {
        let g = grade_text("kitty", &["cat", "kitty", "feline"], &cfg());
        assert_eq!(g.correctness, Correctness::Correct);
        assert_eq!(g.key, "kitty");
    }

    #[test]
    fn japanese_partial_by_character() {
        // 4 key tokens, 3 answer tokens, 3 shared: 6/7
        let g = grade_text("猫が好", &["猫が好き"], &cfg());
        assert_eq!(g.correctness, Correctness::PartiallyCorrect);
        assert_eq!(g.missing, vec!["き"]);
    }

    #[test]
    fn compact_spacing_counts_as_correct() {
        let g = grade_text("icecream", &["ice cream"], &cfg());
        assert_eq!(g.correctness, Correctness::Correct);
    }

    #[test]
    fn grading_is_idempotent() {
        let answer = "Le Café, s'il vous plaît";
        let key = ["le café s'il vous plait"];
        let first = grade_text(answer, &key, &cfg());
        let second = grade_text(answer, &key, &cfg());
        assert_eq!(first, second);

        let normalized = crate::text::normalize(answer, true);
        let third = grade_text(&normalized, &key, &cfg());
        assert_eq!(first.correctness, third.correctness);
    }

    #[test]
    fn choice_grading() {
        assert_eq!(grade_choice(1, 1, 4).unwrap(), Correctness::Correct);
        assert_eq!(grade_choice(0, 1, 4).unwrap(), Correctness::Incorrect);
        assert!(matches!(
            grade_choice(4, 1, 4),
            Err(PracticeError::ChoiceOutOfRange { index: 5, len: 4 })
        ));
    }

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|x| x.to_string()).collect()
    }

    #[test]
    fn order_grading() {
        let pieces = s(&["ta", "ka", "na"]);
        let key = s(&["ka", "ta", "na"]);

        let (c, r) = grade_order(&[1, 0, 2], &pieces, &key, &cfg()).unwrap();
        assert_eq!(c, Correctness::Correct);
        assert_eq!(r, 1.0);

        // ta ka na vs ka ta na: LCS 2/3
        let (c, _) = grade_order(&[0, 1, 2], &pieces, &key, &cfg()).unwrap();
        assert_eq!(c, Correctness::PartiallyCorrect);

        // na ta ka vs ka ta na: LCS 1/3
        let (c, _) = grade_order(&[2, 0, 1], &pieces, &key, &cfg()).unwrap();
        assert_eq!(c, Correctness::Incorrect);
    }

    #[test]
    fn order_with_duplicate_pieces() {
        let pieces = s(&["ko", "ko", "ro"]);
        let key = s(&["ko", "ko", "ro"]);
        let (c, _) = grade_order(&[1, 0, 2], &pieces, &key, &cfg()).unwrap();
        assert_eq!(c, Correctness::Correct);
    }

    #[test]
    fn order_must_be_permutation() {
        let pieces = s(&["a", "b"]);
        let key = s(&["b", "a"]);
        assert!(grade_order(&[0], &pieces, &key, &cfg()).is_err());
        assert!(grade_order(&[0, 0], &pieces, &key, &cfg()).is_err());
        assert!(grade_order(&[0, 2], &pieces, &key, &cfg()).is_err());
    }

    #[test]
    fn practice_dispatch_and_mismatch() {
        let practice = Practice {
            id: Uuid::nil(),
            subject: Subject::word(Uuid::nil()),
            prompt: "猫".into(),
            kind: PracticeKind::Selection {
                direction: SelectionDirection::TextToMeaning,
                options: s(&["dog", "cat"]),
                answer: 1,
            },
        };

        let g = grade_practice(&practice, &Answer::Choice(1), &cfg()).unwrap();
        assert_eq!(g.correctness, Correctness::Correct);
        assert_eq!(g.expected, "cat");

        let err = grade_practice(&practice, &Answer::Text("cat".into()), &cfg()).unwrap_err();
        assert!(matches!(err, PracticeError::AnswerMismatch { .. }));
    }

    #[test]
    fn correctness_ordering_and_score() {
        assert!(Correctness::Correct > Correctness::PartiallyCorrect);
        assert!(Correctness::PartiallyCorrect > Correctness::Incorrect);
        assert_eq!(Correctness::PartiallyCorrect.score(), 0.5);
        assert_eq!(Correctness::PartiallyCorrect.to_string(), "partially correct");
    }
}
