//! Fixed line-count segmentation.

use super::{three_sections, Section, Segmenter};
use crate::transcript::TranscriptLine;

/// Takes a fixed number of leading lines as the introduction and trailing lines
/// as the questions. Short transcripts fill the introduction first and never
/// repeat a line in two sections.
pub struct SentenceCountSegmenter {
    introduction_lines: usize,
    question_lines: usize,
}

impl SentenceCountSegmenter {
    pub fn new(introduction_lines: usize, question_lines: usize) -> Self {
        Self {
            introduction_lines,
            question_lines,
        }
    }
}

impl Default for SentenceCountSegmenter {
    fn default() -> Self {
        Self::new(3, 3)
    }
}

impl Segmenter for SentenceCountSegmenter {
    fn segment(&self, lines: &[TranscriptLine]) -> Vec<Section> {
        if lines.is_empty() {
            return Vec::new();
        }

        let intro_len = self.introduction_lines.min(lines.len());
        let question_len = self.question_lines.min(lines.len() - intro_len);
        let conversation_end = lines.len() - question_len;

        three_sections(
            lines[..intro_len].to_vec(),
            lines[intro_len..conversation_end].to_vec(),
            lines[conversation_end..].to_vec(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::sample_lines;

    #[test]
    fn test_long_transcript() {
        let sections = SentenceCountSegmenter::default().segment(&sample_lines(10, 2.0));
        assert_eq!(sections[0].len(), 3);
        assert_eq!(sections[1].len(), 4);
        assert_eq!(sections[2].len(), 3);
        assert_eq!(sections[2].lines[0].text, "line 7");
    }

    #[test]
    fn test_short_transcript_does_not_duplicate() {
        let sections = SentenceCountSegmenter::default().segment(&sample_lines(4, 2.0));
        assert_eq!(sections[0].len(), 3);
        assert_eq!(sections[1].len(), 0);
        assert_eq!(sections[2].len(), 1);

        let sections = SentenceCountSegmenter::default().segment(&sample_lines(2, 2.0));
        assert_eq!(sections[0].len(), 2);
        assert!(sections[1].is_empty());
        assert!(sections[2].is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(SentenceCountSegmenter::default().segment(&[]).is_empty());
    }
}
