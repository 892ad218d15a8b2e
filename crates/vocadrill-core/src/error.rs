//! Domain error types.
//!
//! `TranslateError` lives here rather than in `vocadrill-providers` so the
//! translation engine can downcast and classify failures without string
//! matching.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when asking a translator for a meaning.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// The translator cannot handle this text or language pair.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// The translator returned nothing usable.
    #[error("translator returned an empty result")]
    Empty,

    /// The translator asked us to slow down.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// The request took too long.
    #[error("translation timed out after {0}s")]
    Timeout(u64),

    /// An external translation command exited unsuccessfully.
    #[error("command failed (exit {status}): {stderr}")]
    CommandFailed { status: i32, stderr: String },

    /// An I/O error talking to the translator.
    #[error("I/O error: {0}")]
    Io(String),
}

impl TranslateError {
    /// Returns `true` if retrying the same translator cannot help.
    pub fn is_permanent(&self) -> bool {
        matches!(self, TranslateError::Unsupported(_) | TranslateError::Empty)
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            TranslateError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}

/// Errors raised while building or grading a practice.
#[derive(Debug, Error, PartialEq)]
pub enum PracticeError {
    /// Not enough distinct candidates to build a multiple-choice question.
    #[error("need at least {needed} distinct options, found {available}")]
    NotEnoughOptions { needed: usize, available: usize },

    /// The word has fewer than two distinct phonetic tokens.
    #[error("word '{0}' has no tokens to reorder")]
    MissingTokens(String),

    /// The word has no pitch-accent information.
    #[error("word '{0}' has no accent information")]
    MissingAccent(String),

    /// No article paragraph contains the word.
    #[error("no paragraph contains '{0}'")]
    NoContext(String),

    /// The deck has nothing to practice.
    #[error("nothing to practice: {0}")]
    Empty(String),

    /// The answer shape does not fit the practice.
    #[error("expected a {expected} answer for this practice, got {got}")]
    AnswerMismatch {
        expected: &'static str,
        got: &'static str,
    },

    /// A choice index outside the option list.
    #[error("choice {index} is out of range (1-{len})")]
    ChoiceOutOfRange { index: usize, len: usize },

    /// A reordering answer that is not a permutation of the pieces.
    #[error("invalid order: {0}")]
    InvalidOrder(String),

    /// Unparsable learner input.
    #[error("could not read answer: {0}")]
    InvalidInput(String),

    /// The session does not contain this practice.
    #[error("unknown practice {0}")]
    UnknownPractice(Uuid),
}
