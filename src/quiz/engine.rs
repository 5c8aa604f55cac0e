//! Linear quiz state machine.

use super::{AnswerRecord, Progress, QuizQuestion};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Phase derived from the engine's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizPhase {
    NotStarted,
    InProgress,
    Complete,
}

/// Ordered questions plus progress and score.
///
/// Holds `score <= current_index <= questions.len()` and one log entry per
/// accepted answer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuizEngine {
    questions: Vec<QuizQuestion>,
    current_index: usize,
    score: usize,
    answer_log: Vec<AnswerRecord>,
}

impl QuizEngine {
    pub fn new(questions: Vec<QuizQuestion>) -> Self {
        Self {
            questions,
            ..Self::default()
        }
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn phase(&self) -> QuizPhase {
        if self.current_index >= self.questions.len() {
            QuizPhase::Complete
        } else if self.current_index == 0 {
            QuizPhase::NotStarted
        } else {
            QuizPhase::InProgress
        }
    }

    pub fn is_complete(&self) -> bool {
        self.phase() == QuizPhase::Complete
    }

    /// The question awaiting an answer, if any.
    pub fn current_question(&self) -> Option<&QuizQuestion> {
        self.questions.get(self.current_index)
    }

    /// Answer the current question and advance.
    ///
    /// Returns whether the answer was correct. Once the quiz is complete this
    /// does nothing and returns `false`.
    pub fn submit_answer(&mut self, answer_index: usize) -> bool {
        let Some(question) = self.current_question() else {
            debug!("Answer submitted after completion, ignoring");
            return false;
        };

        let is_correct = question.is_correct(answer_index);
        self.answer_log.push(AnswerRecord {
            question_index: self.current_index,
            answer_index,
            is_correct,
            answered_at: Utc::now(),
        });

        if is_correct {
            self.score += 1;
        }
        self.current_index += 1;
        is_correct
    }

    /// Start over with the same questions.
    pub fn reset(&mut self) {
        self.current_index = 0;
        self.score = 0;
        self.answer_log.clear();
    }

    pub fn progress(&self) -> Progress {
        let total = self.questions.len();
        let percent = if total == 0 {
            0.0
        } else {
            self.current_index as f64 / total as f64 * 100.0
        };

        Progress {
            current: self.current_index,
            total,
            score: self.score,
            percent,
        }
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn answer_log(&self) -> &[AnswerRecord] {
        &self.answer_log
    }

    /// Most recent accepted answer.
    pub fn last_answer(&self) -> Option<&AnswerRecord> {
        self.answer_log.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::question;

    fn engine(correct: &[usize]) -> QuizEngine {
        QuizEngine::new(
            correct
                .iter()
                .enumerate()
                .map(|(i, c)| question(&format!("q{}", i + 1), *c))
                .collect(),
        )
    }

    fn assert_invariants(engine: &QuizEngine) {
        assert!(engine.score() <= engine.current_index());
        assert!(engine.current_index() <= engine.questions().len());
        assert_eq!(engine.answer_log().len(), engine.current_index());
    }

    #[test]
    fn test_phases() {
        let mut quiz = engine(&[0, 1]);
        assert_eq!(quiz.phase(), QuizPhase::NotStarted);
        assert_eq!(quiz.current_question().unwrap().id, "q1");

        assert!(quiz.submit_answer(0));
        assert_eq!(quiz.phase(), QuizPhase::InProgress);

        assert!(!quiz.submit_answer(3));
        assert_eq!(quiz.phase(), QuizPhase::Complete);
        assert!(quiz.current_question().is_none());

        let progress = quiz.progress();
        assert_eq!((progress.current, progress.total, progress.score), (2, 2, 1));
        assert_eq!(progress.percent, 100.0);
    }

    #[test]
    fn test_empty_quiz_is_complete() {
        let mut quiz = QuizEngine::new(vec![]);
        assert!(quiz.is_complete());
        assert!(!quiz.submit_answer(0));
        assert!(quiz.answer_log().is_empty());

        let progress = quiz.progress();
        assert_eq!((progress.current, progress.total, progress.score), (0, 0, 0));
        assert_eq!(progress.percent, 0.0);
    }

    #[test]
    fn test_submit_after_completion_is_noop() {
        let mut quiz = engine(&[2]);
        assert!(quiz.submit_answer(2));
        assert!(!quiz.submit_answer(2));
        assert_eq!(quiz.score(), 1);
        assert_eq!(quiz.answer_log().len(), 1);
        assert_invariants(&quiz);
    }

    #[test]
    fn test_correct_answer_advances_by_one() {
        let mut quiz = engine(&[1, 1, 1]);
        for _ in 0..3 {
            let (index, score) = (quiz.current_index(), quiz.score());
            assert!(quiz.submit_answer(1));
            assert_eq!(quiz.current_index(), index + 1);
            assert_eq!(quiz.score(), score + 1);
        }
    }

    #[test]
    fn test_invariants_hold_for_all_answer_sequences() {
        let correct = [0, 3, 1];
        // Every sequence of three answers from 0..5, including out-of-range picks.
        for code in 0..125 {
            let answers = [code % 5, (code / 5) % 5, code / 25];
            let mut quiz = engine(&correct);

            for answer in answers {
                quiz.submit_answer(answer);
                assert_invariants(&quiz);
            }
            quiz.submit_answer(0);
            assert_invariants(&quiz);

            let expected = answers.iter().zip(correct).filter(|(a, c)| **a == *c).count();
            assert_eq!(quiz.score(), expected);

            let first_score = quiz.score();
            quiz.reset();
            assert_eq!(quiz.phase(), QuizPhase::NotStarted);
            assert!(quiz.answer_log().is_empty());
            assert_eq!(quiz.questions().len(), 3);

            for answer in answers {
                quiz.submit_answer(answer);
            }
            assert_eq!(quiz.score(), first_score);
        }
    }

    #[test]
    fn test_answer_log_records_submissions() {
        let mut quiz = engine(&[0, 1]);
        quiz.submit_answer(2);
        let record = quiz.last_answer().unwrap();
        assert_eq!(record.question_index, 0);
        assert_eq!(record.answer_index, 2);
        assert!(!record.is_correct);
    }
}
