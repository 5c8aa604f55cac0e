//! Transcript segmentation into introduction, conversation, and questions.
//!
//! A JLPT listening item opens with a short introduction of the situation, plays
//! the conversation, and closes with the question. Both policies here are
//! positional heuristics; exactly one is active, chosen by configuration.

mod sentence_count;
mod time_ratio;

pub use sentence_count::SentenceCountSegmenter;
pub use time_ratio::TimeRatioSegmenter;

use crate::config::SegmentationSettings;
use crate::transcript::{join_text, TranscriptLine};
use serde::{Deserialize, Serialize};

/// Named section of a listening transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Introduction,
    Conversation,
    Questions,
}

impl SectionKind {
    /// All kinds in transcript order.
    pub const ALL: [SectionKind; 3] = [
        SectionKind::Introduction,
        SectionKind::Conversation,
        SectionKind::Questions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Introduction => "introduction",
            SectionKind::Conversation => "conversation",
            SectionKind::Questions => "questions",
        }
    }
}

impl std::fmt::Display for SectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SectionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "introduction" | "intro" => Ok(SectionKind::Introduction),
            "conversation" => Ok(SectionKind::Conversation),
            "questions" | "question" => Ok(SectionKind::Questions),
            _ => Err(format!("Unknown section: {}", s)),
        }
    }
}

/// A contiguous named run of transcript lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub kind: SectionKind,
    pub lines: Vec<TranscriptLine>,
}

impl Section {
    pub fn new(kind: SectionKind, lines: Vec<TranscriptLine>) -> Self {
        Self { kind, lines }
    }

    /// Section text with lines joined by a space.
    pub fn text(&self) -> String {
        join_text(&self.lines)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Segmentation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentationPolicy {
    /// Split by fractions of the total duration.
    #[default]
    TimeRatio,
    /// Fixed number of leading and trailing lines.
    SentenceCount,
}

impl std::str::FromStr for SegmentationPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "time_ratio" | "time" => Ok(SegmentationPolicy::TimeRatio),
            "sentence_count" | "sentence" => Ok(SegmentationPolicy::SentenceCount),
            _ => Err(format!("Unknown segmentation policy: {}", s)),
        }
    }
}

impl std::fmt::Display for SegmentationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SegmentationPolicy::TimeRatio => write!(f, "time_ratio"),
            SegmentationPolicy::SentenceCount => write!(f, "sentence_count"),
        }
    }
}

/// Trait for segmentation implementations.
///
/// Implementations return the three sections in transcript order, or an empty
/// list for empty input. Every input line lands in exactly one section.
pub trait Segmenter: Send + Sync {
    fn segment(&self, lines: &[TranscriptLine]) -> Vec<Section>;
}

/// Create the segmenter selected by the settings.
pub fn create_segmenter(settings: &SegmentationSettings) -> Box<dyn Segmenter> {
    match settings.policy {
        SegmentationPolicy::TimeRatio => Box::new(TimeRatioSegmenter::new(
            settings.introduction_ratio,
            settings.conversation_end_ratio,
        )),
        SegmentationPolicy::SentenceCount => Box::new(SentenceCountSegmenter::new(
            settings.introduction_lines,
            settings.question_lines,
        )),
    }
}

/// Find a section by kind.
pub fn find_section(sections: &[Section], kind: SectionKind) -> Option<&Section> {
    sections.iter().find(|s| s.kind == kind)
}

/// Assemble the three sections from their line vectors.
pub(crate) fn three_sections(
    introduction: Vec<TranscriptLine>,
    conversation: Vec<TranscriptLine>,
    questions: Vec<TranscriptLine>,
) -> Vec<Section> {
    vec![
        Section::new(SectionKind::Introduction, introduction),
        Section::new(SectionKind::Conversation, conversation),
        Section::new(SectionKind::Questions, questions),
    ]
}

#[cfg(test)]
pub(crate) fn sample_lines(count: usize, step: f64) -> Vec<TranscriptLine> {
    (0..count)
        .map(|i| TranscriptLine::new(format!("line {}", i), i as f64 * step, step))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_kind_parse() {
        assert_eq!("intro".parse::<SectionKind>().unwrap(), SectionKind::Introduction);
        assert_eq!("Questions".parse::<SectionKind>().unwrap(), SectionKind::Questions);
        assert!("outro".parse::<SectionKind>().is_err());
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("time-ratio".parse::<SegmentationPolicy>().unwrap(), SegmentationPolicy::TimeRatio);
        assert_eq!("sentence_count".parse::<SegmentationPolicy>().unwrap(), SegmentationPolicy::SentenceCount);
        assert!("topic".parse::<SegmentationPolicy>().is_err());
    }

    #[test]
    fn test_every_policy_preserves_lines() {
        for policy in [SegmentationPolicy::TimeRatio, SegmentationPolicy::SentenceCount] {
            let settings = SegmentationSettings {
                policy,
                ..SegmentationSettings::default()
            };
            let segmenter = create_segmenter(&settings);

            for count in 0..15 {
                let lines = sample_lines(count, 4.0);
                let sections = segmenter.segment(&lines);
                let total: usize = sections.iter().map(|s| s.len()).sum();
                assert_eq!(total, count, "{policy} dropped or duplicated lines for {count}");

                let flattened: Vec<TranscriptLine> =
                    sections.iter().flat_map(|s| s.lines.clone()).collect();
                assert_eq!(flattened, lines);
            }
        }
    }

    #[test]
    fn test_section_text() {
        let section = Section::new(SectionKind::Conversation, sample_lines(2, 1.0));
        assert_eq!(section.text(), "line 0 line 1");
    }
}
