//! Practice items and learner answers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PracticeError;

/// The shape of a practice, without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PracticeKindTag {
    Selection,
    Filling,
    Reordering,
    Accent,
    Context,
    Reading,
    Translation,
}

impl PracticeKindTag {
    pub const WORD_KINDS: [PracticeKindTag; 5] = [
        PracticeKindTag::Selection,
        PracticeKindTag::Filling,
        PracticeKindTag::Reordering,
        PracticeKindTag::Accent,
        PracticeKindTag::Context,
    ];

    pub const ARTICLE_KINDS: [PracticeKindTag; 2] =
        [PracticeKindTag::Reading, PracticeKindTag::Translation];

    /// Whether this kind is generated from a single word.
    pub fn is_word_kind(self) -> bool {
        Self::WORD_KINDS.contains(&self)
    }
}

impl fmt::Display for PracticeKindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PracticeKindTag::Selection => "selection",
            PracticeKindTag::Filling => "filling",
            PracticeKindTag::Reordering => "reordering",
            PracticeKindTag::Accent => "accent",
            PracticeKindTag::Context => "context",
            PracticeKindTag::Reading => "reading",
            PracticeKindTag::Translation => "translation",
        };
        write!(f, "{s}")
    }
}

impl FromStr for PracticeKindTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "selection" | "select" | "choice" => Ok(PracticeKindTag::Selection),
            "filling" | "fill" => Ok(PracticeKindTag::Filling),
            "reordering" | "reorder" | "order" => Ok(PracticeKindTag::Reordering),
            "accent" => Ok(PracticeKindTag::Accent),
            "context" | "cloze" => Ok(PracticeKindTag::Context),
            "reading" | "read" => Ok(PracticeKindTag::Reading),
            "translation" | "translate" => Ok(PracticeKindTag::Translation),
            other => Err(format!("unknown practice kind: {other}")),
        }
    }
}

/// What a practice is about. Answer history is keyed by subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Subject {
    Word { id: Uuid },
    Paragraph { article: Uuid, index: usize },
}

impl Subject {
    pub fn word(id: Uuid) -> Self {
        Subject::Word { id }
    }

    pub fn paragraph(article: Uuid, index: usize) -> Self {
        Subject::Paragraph { article, index }
    }
}

/// Which side of a word is shown in a selection practice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionDirection {
    /// Show the word, choose its meaning.
    TextToMeaning,
    /// Show the meaning, choose the word.
    MeaningToText,
}

/// Practice data, one variant per shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PracticeKind {
    Selection {
        direction: SelectionDirection,
        options: Vec<String>,
        answer: usize,
    },
    Filling {
        hint: String,
        key: String,
    },
    Reordering {
        pieces: Vec<String>,
        key: Vec<String>,
    },
    Accent {
        reading: String,
        options: Vec<String>,
        answer: usize,
    },
    Context {
        sentence: String,
        key: String,
    },
    Reading {
        key: String,
    },
    Translation {
        key: String,
    },
}

impl PracticeKind {
    pub fn tag(&self) -> PracticeKindTag {
        match self {
            PracticeKind::Selection { .. } => PracticeKindTag::Selection,
            PracticeKind::Filling { .. } => PracticeKindTag::Filling,
            PracticeKind::Reordering { .. } => PracticeKindTag::Reordering,
            PracticeKind::Accent { .. } => PracticeKindTag::Accent,
            PracticeKind::Context { .. } => PracticeKindTag::Context,
            PracticeKind::Reading { .. } => PracticeKindTag::Reading,
            PracticeKind::Translation { .. } => PracticeKindTag::Translation,
        }
    }

    /// The answer shape this practice expects.
    pub fn answer_shape(&self) -> &'static str {
        match self {
            PracticeKind::Selection { .. } | PracticeKind::Accent { .. } => "choice",
            PracticeKind::Reordering { .. } => "order",
            _ => "text",
        }
    }
}

/// A generated quiz item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Practice {
    pub id: Uuid,
    pub subject: Subject,
    /// What the learner is shown.
    pub prompt: String,
    pub kind: PracticeKind,
}

impl Practice {
    pub fn tag(&self) -> PracticeKindTag {
        self.kind.tag()
    }

    /// Human-readable expected answer.
    pub fn expected(&self) -> String {
        match &self.kind {
            PracticeKind::Selection {
                options, answer, ..
            }
            | PracticeKind::Accent {
                options, answer, ..
            } => options.get(*answer).cloned().unwrap_or_default(),
            PracticeKind::Reordering { key, .. } => key.concat(),
            PracticeKind::Filling { key, .. }
            | PracticeKind::Context { key, .. }
            | PracticeKind::Reading { key }
            | PracticeKind::Translation { key } => key.clone(),
        }
    }
}

/// A learner's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Answer {
    /// Zero-based option index.
    Choice(usize),
    Text(String),
    /// Zero-based piece indices in the learner's order.
    Order(Vec<usize>),
}

impl Answer {
    pub fn shape(&self) -> &'static str {
        match self {
            Answer::Choice(_) => "choice",
            Answer::Text(_) => "text",
            Answer::Order(_) => "order",
        }
    }

    /// Parse console input for a practice. Choices and orders are 1-based.
    pub fn parse_for(kind: &PracticeKind, input: &str) -> Result<Answer, PracticeError> {
        let input = input.trim();
        match kind {
            PracticeKind::Selection { .. } | PracticeKind::Accent { .. } => {
                let n: usize = input
                    .parse()
                    .map_err(|_| PracticeError::InvalidInput(format!("not a number: {input}")))?;
                if n == 0 {
                    return Err(PracticeError::InvalidInput("choices start at 1".into()));
                }
                Ok(Answer::Choice(n - 1))
            }
            PracticeKind::Reordering { .. } => {
                let order = input
                    .split(|c: char| c.is_whitespace() || c == ',')
                    .filter(|s| !s.is_empty())
                    .map(|s| match s.parse::<usize>() {
                        Ok(n) if n >= 1 => Ok(n - 1),
                        _ => Err(PracticeError::InvalidInput(format!("bad position: {s}"))),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Answer::Order(order))
            }
            PracticeKind::Filling { .. }
            | PracticeKind::Context { .. }
            | PracticeKind::Reading { .. }
            | PracticeKind::Translation { .. } => Ok(Answer::Text(input.to_string())),
        }
    }
}
