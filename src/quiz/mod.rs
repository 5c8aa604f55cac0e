//! Multiple-choice listening quizzes.
//!
//! Questions come from extracted cases or from transcript dialogues
//! ([`QuizBuilder`]), are cached per video ([`QuizCache`]), and are answered one
//! at a time through a [`QuizEngine`].

mod builder;
mod cache;
mod dialogue;
mod engine;

pub use builder::{placeholder_questions, QuizBuilder};
pub use cache::QuizCache;
pub use dialogue::{build_dialogue, group_lines, split_sentences, Dialogue, DialogueLine, Speaker};
pub use engine::{QuizEngine, QuizPhase};

use crate::error::{KikitoriError, Result};
use crate::transcript::TranscriptLine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of options per question.
pub const OPTION_COUNT: usize = 4;

/// A four-option question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedQuestion")]
pub struct QuizQuestion {
    pub id: String,
    pub prompt: String,
    pub options: [String; OPTION_COUNT],
    pub correct_index: usize,
    pub explanation: String,
    /// Text the question is about (dialogue or conversation).
    pub passage: String,
    /// First transcript line the passage was built from.
    pub source_segment: Option<TranscriptLine>,
}

/// Cached form, validated on the way in.
#[derive(Deserialize)]
struct UncheckedQuestion {
    id: String,
    prompt: String,
    options: [String; OPTION_COUNT],
    correct_index: usize,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    passage: String,
    #[serde(default)]
    source_segment: Option<TranscriptLine>,
}

impl TryFrom<UncheckedQuestion> for QuizQuestion {
    type Error = KikitoriError;

    fn try_from(raw: UncheckedQuestion) -> Result<Self> {
        QuizQuestion::new(
            raw.id,
            raw.prompt,
            raw.options,
            raw.correct_index,
            raw.explanation,
            raw.passage,
        )
        .map(|q| q.with_source_segment(raw.source_segment))
    }
}

impl QuizQuestion {
    /// Create a question, rejecting an out-of-range `correct_index`.
    pub fn new(
        id: impl Into<String>,
        prompt: impl Into<String>,
        options: [String; OPTION_COUNT],
        correct_index: usize,
        explanation: impl Into<String>,
        passage: impl Into<String>,
    ) -> Result<Self> {
        if correct_index >= OPTION_COUNT {
            return Err(KikitoriError::Quiz(format!(
                "correct_index {} out of range",
                correct_index
            )));
        }

        Ok(Self {
            id: id.into(),
            prompt: prompt.into(),
            options,
            correct_index,
            explanation: explanation.into(),
            passage: passage.into(),
            source_segment: None,
        })
    }

    pub fn with_source_segment(mut self, segment: Option<TranscriptLine>) -> Self {
        self.source_segment = segment;
        self
    }

    /// Placeholder used when a question cannot be generated.
    pub fn fallback(id: impl Into<String>, passage: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            prompt: "What is the main topic of this conversation?".to_string(),
            options: [
                "A casual conversation between friends".to_string(),
                "A business meeting".to_string(),
                "A classroom discussion".to_string(),
                "A news report".to_string(),
            ],
            correct_index: 0,
            explanation: "The conversation appears to be a casual exchange between friends."
                .to_string(),
            passage: passage.into(),
            source_segment: None,
        }
    }

    pub fn correct_answer(&self) -> &str {
        &self.options[self.correct_index]
    }

    pub fn is_correct(&self, answer_index: usize) -> bool {
        answer_index == self.correct_index
    }
}

/// One accepted submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_index: usize,
    pub answer_index: usize,
    pub is_correct: bool,
    pub answered_at: DateTime<Utc>,
}

/// Snapshot of quiz progress.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// Questions answered so far.
    pub current: usize,
    pub total: usize,
    pub score: usize,
    /// Completion percentage.
    pub percent: f64,
}

#[cfg(test)]
pub(crate) fn question(id: &str, correct_index: usize) -> QuizQuestion {
    QuizQuestion::new(
        id,
        format!("Question {}", id),
        ["a".into(), "b".into(), "c".into(), "d".into()],
        correct_index,
        "",
        "passage",
    )
    .unwrap()
}
