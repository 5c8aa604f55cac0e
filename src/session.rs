//! Per-user study state.
//!
//! Everything a learner has loaded lives here and is passed explicitly to the
//! code that needs it.

use crate::extraction::ListeningCase;
use crate::index::SearchHit;
use crate::quiz::{QuizEngine, QuizQuestion};
use crate::segmentation::{find_section, Section, SectionKind, Segmenter};
use crate::transcript::Transcript;

/// State of one study session.
#[derive(Default)]
pub struct StudySession {
    transcript: Option<Transcript>,
    level: Option<String>,
    sections: Vec<Section>,
    cases: Vec<ListeningCase>,
    quiz: QuizEngine,
    last_search: Vec<SearchHit>,
}

impl StudySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a transcript and segment it. Clears cases, quiz, and search results.
    pub fn load_transcript(&mut self, transcript: Transcript, level: Option<String>, segmenter: &dyn Segmenter) {
        self.sections = segmenter.segment(&transcript.lines);
        self.transcript = Some(transcript);
        self.level = level;
        self.cases.clear();
        self.quiz = QuizEngine::default();
        self.last_search.clear();
    }

    pub fn video_id(&self) -> Option<&str> {
        self.transcript.as_ref().map(|t| t.video_id.as_str())
    }

    pub fn level(&self) -> Option<&str> {
        self.level.as_deref()
    }

    pub fn transcript(&self) -> Option<&Transcript> {
        self.transcript.as_ref()
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        find_section(&self.sections, kind)
    }

    pub fn set_cases(&mut self, cases: Vec<ListeningCase>) {
        self.cases = cases;
    }

    pub fn cases(&self) -> &[ListeningCase] {
        &self.cases
    }

    /// Replace the quiz with a fresh engine over `questions`.
    pub fn start_quiz(&mut self, questions: Vec<QuizQuestion>) {
        self.quiz = QuizEngine::new(questions);
    }

    pub fn quiz(&self) -> &QuizEngine {
        &self.quiz
    }

    pub fn quiz_mut(&mut self) -> &mut QuizEngine {
        &mut self.quiz
    }

    pub fn record_search(&mut self, hits: Vec<SearchHit>) {
        self.last_search = hits;
    }

    pub fn last_search(&self) -> &[SearchHit] {
        &self.last_search
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::question;
    use crate::segmentation::{sample_lines, TimeRatioSegmenter};

    #[test]
    fn test_loading_a_transcript_resets_state() {
        let mut session = StudySession::new();
        assert!(session.video_id().is_none());
        assert!(session.quiz().is_complete());

        let segmenter = TimeRatioSegmenter::default();
        session.load_transcript(Transcript::new("v1", sample_lines(10, 10.0)), Some("N5".into()), &segmenter);
        session.start_quiz(vec![question("q1", 0), question("q2", 1)]);
        session.quiz_mut().submit_answer(0);
        session.set_cases(vec![ListeningCase::default()]);

        assert_eq!(session.video_id(), Some("v1"));
        assert_eq!(session.level(), Some("N5"));
        assert_eq!(session.section(SectionKind::Introduction).unwrap().len(), 2);
        assert_eq!(session.quiz().score(), 1);

        session.load_transcript(Transcript::new("v2", sample_lines(4, 1.0)), None, &segmenter);
        assert_eq!(session.video_id(), Some("v2"));
        assert!(session.cases().is_empty());
        assert!(session.quiz().questions().is_empty());
        assert!(session.last_search().is_empty());
    }
}
