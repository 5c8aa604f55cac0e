//! Structured extraction of listening cases from a transcript.
//!
//! A generative model reads the whole transcript and returns one
//! situation / conversation / question triple per test item.

mod parse;

pub use parse::{dedup_cases, parse_choices, CaseParser};

use crate::config::Prompts;
use crate::error::Result;
use crate::generation::TextGenerator;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// One extracted test item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListeningCase {
    #[serde(default, alias = "Situation description", alias = "introduction")]
    pub situation: String,
    #[serde(default, alias = "Full conversation details")]
    pub conversation: String,
    #[serde(default, alias = "Specific question")]
    pub question: String,
}

impl ListeningCase {
    /// True when every field is blank.
    pub fn is_empty(&self) -> bool {
        self.situation.trim().is_empty()
            && self.conversation.trim().is_empty()
            && self.question.trim().is_empty()
    }

    pub fn dedup_key(&self) -> String {
        format!("{}_{}_{}", self.situation, self.conversation, self.question)
    }
}

/// Model-generated answer options for a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceSet {
    pub correct_answer: String,
    pub options: Vec<String>,
}

/// Which path produced the extracted cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionSource {
    /// The reply deserialized cleanly.
    Parsed,
    /// Recovered field by field from malformed output.
    Fallback,
    /// The model could not be reached or the input was empty.
    Unavailable,
}

impl std::fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionSource::Parsed => write!(f, "parsed"),
            ExtractionSource::Fallback => write!(f, "fallback"),
            ExtractionSource::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Result of an extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    pub cases: Vec<ListeningCase>,
    pub source: ExtractionSource,
}

impl ExtractionOutcome {
    /// Empty outcome for when no model can be asked.
    pub fn unavailable() -> Self {
        Self {
            cases: Vec::new(),
            source: ExtractionSource::Unavailable,
        }
    }
}

/// Extracts listening cases with a generative model.
pub struct StructuredExtractor {
    generator: Arc<dyn TextGenerator>,
    prompts: Prompts,
    parser: CaseParser,
}

impl StructuredExtractor {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            prompts: Prompts::default(),
            parser: CaseParser::new(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Extract cases from the full transcript text. Never fails.
    #[instrument(skip(self, transcript_text), fields(model = %self.generator.model()))]
    pub async fn extract(&self, transcript_text: &str) -> ExtractionOutcome {
        if transcript_text.trim().is_empty() {
            warn!("Empty transcript, nothing to extract");
            return ExtractionOutcome::unavailable();
        }

        let raw = match self.request_cases(transcript_text).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Case extraction failed: {}", e);
                return ExtractionOutcome::unavailable();
            }
        };

        let (cases, source) = self.parser.parse(&raw);
        info!("Extracted {} cases ({})", cases.len(), source);
        ExtractionOutcome { cases, source }
    }

    async fn request_cases(&self, transcript_text: &str) -> Result<String> {
        let mut vars = HashMap::new();
        vars.insert("transcript".to_string(), transcript_text.to_string());

        let prompt = self
            .prompts
            .render_with_custom(&self.prompts.extraction.user, &vars);

        self.generator
            .complete(Some(&self.prompts.extraction.system), &prompt)
            .await
    }

    /// Ask the model for four answer options for a case.
    ///
    /// Returns `None` when the model fails or the reply is unusable.
    #[instrument(skip(self, case))]
    pub async fn generate_choices(&self, case: &ListeningCase) -> Option<ChoiceSet> {
        let mut vars = HashMap::new();
        vars.insert("situation".to_string(), case.situation.clone());
        vars.insert("conversation".to_string(), case.conversation.clone());
        vars.insert("question".to_string(), case.question.clone());

        let prompt = self.prompts.render_with_custom(&self.prompts.quiz.choices, &vars);

        match self.generator.complete(None, &prompt).await {
            Ok(raw) => {
                let choices = parse_choices(&raw);
                if choices.is_none() {
                    warn!("Unusable choice reply for question {:?}", case.question);
                }
                choices
            }
            Err(e) => {
                warn!("Choice generation failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KikitoriError;
    use crate::generation::test_support::ScriptedGenerator;

    #[tokio::test]
    async fn test_extract_parsed() {
        let generator = Arc::new(ScriptedGenerator::replying(&[
            r#"[{"situation": "s1", "conversation": "c1", "question": "q1"},
                {"situation": "s1", "conversation": "c1", "question": "q1"},
                {"situation": "s2", "conversation": "c2", "question": "q2"}]"#,
        ]));
        let extractor = StructuredExtractor::new(generator.clone());

        let outcome = extractor.extract("男：こんにちは 女：こんにちは").await;
        assert_eq!(outcome.source, ExtractionSource::Parsed);
        assert_eq!(outcome.cases.len(), 2);
        assert_eq!(outcome.cases[1].question, "q2");

        let prompt = generator.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains("男：こんにちは"));
        assert!(!prompt.contains("{{transcript}}"));
    }

    #[tokio::test]
    async fn test_extract_degrades_on_failure() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Err(KikitoriError::Generation(
            "timeout".to_string(),
        ))]));
        let extractor = StructuredExtractor::new(generator);

        let outcome = extractor.extract("transcript").await;
        assert_eq!(outcome.source, ExtractionSource::Unavailable);
        assert!(outcome.cases.is_empty());
    }

    #[tokio::test]
    async fn test_empty_transcript_skips_model() {
        let generator = Arc::new(ScriptedGenerator::failing());
        let extractor = StructuredExtractor::new(generator.clone());

        let outcome = extractor.extract("   ").await;
        assert_eq!(outcome.source, ExtractionSource::Unavailable);
        assert_eq!(generator.prompt_count(), 0);
    }

    #[tokio::test]
    async fn test_generate_choices() {
        let generator = Arc::new(ScriptedGenerator::replying(&[
            r#"{"correct_answer": "バス", "options": ["電車", "バス", "タクシー", "自転車"]}"#,
            "sorry",
        ]));
        let extractor = StructuredExtractor::new(generator);
        let case = ListeningCase {
            situation: "駅で".to_string(),
            conversation: "c".to_string(),
            question: "何で行きますか".to_string(),
        };

        let choices = extractor.generate_choices(&case).await.unwrap();
        assert_eq!(choices.correct_answer, "バス");
        assert!(extractor.generate_choices(&case).await.is_none());
        assert!(extractor.generate_choices(&case).await.is_none());
    }

    #[test]
    fn test_case_helpers() {
        let case = ListeningCase {
            situation: "a".to_string(),
            conversation: "b".to_string(),
            question: "c".to_string(),
        };
        assert_eq!(case.dedup_key(), "a_b_c");
        assert!(!case.is_empty());
        assert!(ListeningCase::default().is_empty());
    }
}
