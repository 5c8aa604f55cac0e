//! Duration-ratio segmentation.

use super::{three_sections, Section, Segmenter};
use crate::transcript::{total_duration, TranscriptLine};

/// Splits a transcript at fixed fractions of its total duration.
///
/// A line belongs to the section its start time falls in.
pub struct TimeRatioSegmenter {
    introduction_ratio: f64,
    conversation_end_ratio: f64,
}

const DEFAULT_INTRODUCTION_RATIO: f64 = 0.2;
const DEFAULT_CONVERSATION_END_RATIO: f64 = 0.7;

impl TimeRatioSegmenter {
    /// Ratios are clamped to `0.0..=1.0`; non-finite values use the defaults.
    pub fn new(introduction_ratio: f64, conversation_end_ratio: f64) -> Self {
        let introduction_ratio = finite_or(introduction_ratio, DEFAULT_INTRODUCTION_RATIO).clamp(0.0, 1.0);
        let conversation_end_ratio =
            finite_or(conversation_end_ratio, DEFAULT_CONVERSATION_END_RATIO).clamp(introduction_ratio, 1.0);
        Self {
            introduction_ratio,
            conversation_end_ratio,
        }
    }
}

fn finite_or(value: f64, default: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        default
    }
}

impl Default for TimeRatioSegmenter {
    fn default() -> Self {
        Self::new(DEFAULT_INTRODUCTION_RATIO, DEFAULT_CONVERSATION_END_RATIO)
    }
}

impl Segmenter for TimeRatioSegmenter {
    fn segment(&self, lines: &[TranscriptLine]) -> Vec<Section> {
        if lines.is_empty() {
            return Vec::new();
        }

        let total = total_duration(lines);
        if total <= 0.0 {
            return three_sections(lines.to_vec(), Vec::new(), Vec::new());
        }

        let intro_end = total * self.introduction_ratio;
        let conversation_end = total * self.conversation_end_ratio;

        let mut introduction = Vec::new();
        let mut conversation = Vec::new();
        let mut questions = Vec::new();

        for line in lines {
            if line.start < intro_end {
                introduction.push(line.clone());
            } else if line.start < conversation_end {
                conversation.push(line.clone());
            } else {
                questions.push(line.clone());
            }
        }

        three_sections(introduction, conversation, questions)
    }
}
