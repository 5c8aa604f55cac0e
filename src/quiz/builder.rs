//! Turning extracted cases and transcript dialogues into quiz questions.

use super::dialogue::{build_dialogue, group_lines};
use super::{QuizQuestion, OPTION_COUNT};
use crate::config::Prompts;
use crate::extraction::{ChoiceSet, ListeningCase, StructuredExtractor};
use crate::generation::{strip_code_fences, TextGenerator};
use crate::transcript::TranscriptLine;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Question reply for a dialogue.
#[derive(Debug, Deserialize)]
struct DialogueReply {
    question: String,
    options: Vec<String>,
    correct_index: usize,
}

/// Builds quiz questions with a generative model.
///
/// Any question the model fails to produce is replaced by
/// [`QuizQuestion::fallback`], so the number of questions only depends on the
/// input.
pub struct QuizBuilder {
    generator: Arc<dyn TextGenerator>,
    extractor: StructuredExtractor,
    prompts: Prompts,
    max_questions: usize,
}

impl QuizBuilder {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            extractor: StructuredExtractor::new(generator.clone()),
            generator,
            prompts: Prompts::default(),
            max_questions: 5,
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.extractor = self.extractor.with_prompts(prompts.clone());
        self.prompts = prompts;
        self
    }

    pub fn with_max_questions(mut self, max_questions: usize) -> Self {
        self.max_questions = max_questions;
        self
    }

    /// One question per extracted case, options generated by the model.
    #[instrument(skip(self, cases), fields(cases = cases.len()))]
    pub async fn from_cases(&self, cases: &[ListeningCase]) -> Vec<QuizQuestion> {
        let mut questions = Vec::new();

        for (i, case) in cases.iter().take(self.max_questions).enumerate() {
            let id = format!("q{}", i + 1);
            let passage = format!("{}\n\n{}", case.situation, case.conversation)
                .trim()
                .to_string();

            let arranged = match self.extractor.generate_choices(case).await {
                Some(choices) => arrange_options(choices),
                None => None,
            };

            let question = match arranged {
                Some((options, correct_index)) => {
                    let explanation = self
                        .explain(&case.question, &options, correct_index)
                        .await;
                    QuizQuestion::new(&id, &case.question, options, correct_index, explanation, &passage)
                        .unwrap_or_else(|_| QuizQuestion::fallback(&id, &passage))
                }
                None => {
                    warn!("Using fallback question for case {}", i + 1);
                    QuizQuestion::fallback(&id, &passage)
                }
            };

            questions.push(question);
        }

        info!("Built {} questions from cases", questions.len());
        questions
    }

    /// One question per dialogue window of the transcript.
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn from_dialogues(&self, lines: &[TranscriptLine], window_secs: f64) -> Vec<QuizQuestion> {
        let mut questions = Vec::new();

        let dialogues = group_lines(lines, window_secs)
            .iter()
            .map(|group| build_dialogue(group, window_secs))
            .filter(|dialogue| !dialogue.is_empty())
            .take(self.max_questions)
            .collect::<Vec<_>>();

        for (i, dialogue) in dialogues.into_iter().enumerate() {
            let id = format!("q{}", i + 1);
            let passage = dialogue.format();

            let question = match self.ask_dialogue_question(&passage).await {
                Some(reply) => {
                    let explanation = self
                        .explain(&reply.question, &reply.options, reply.correct_index)
                        .await;
                    QuizQuestion::new(&id, reply.question, reply.options, reply.correct_index, explanation, &passage)
                        .unwrap_or_else(|_| QuizQuestion::fallback(&id, &passage))
                }
                None => QuizQuestion::fallback(&id, &passage),
            };

            questions.push(question.with_source_segment(dialogue.source));
        }

        info!("Built {} questions from dialogues", questions.len());
        questions
    }

    async fn ask_dialogue_question(&self, conversation: &str) -> Option<ValidReply> {
        let mut vars = HashMap::new();
        vars.insert("conversation".to_string(), conversation.to_string());
        let prompt = self
            .prompts
            .render_with_custom(&self.prompts.quiz.dialogue_user, &vars);

        let raw = match self
            .generator
            .complete(Some(&self.prompts.quiz.dialogue_system), &prompt)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Dialogue question generation failed: {}", e);
                return None;
            }
        };

        let reply = parse_dialogue_reply(&raw);
        if reply.is_none() {
            warn!("Unusable dialogue question reply");
        }
        reply
    }

    /// One-sentence explanation, or a plain statement of the answer.
    async fn explain(&self, question: &str, options: &[String; OPTION_COUNT], correct_index: usize) -> String {
        let correct = &options[correct_index];
        let others: Vec<&str> = options
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != correct_index)
            .map(|(_, o)| o.as_str())
            .collect();

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("correct_answer".to_string(), correct.clone());
        vars.insert("other_options".to_string(), others.join(", "));
        let prompt = self
            .prompts
            .render_with_custom(&self.prompts.quiz.explanation, &vars);

        match self.generator.complete(None, &prompt).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => format!("The correct answer is: {}", correct),
            Err(e) => {
                warn!("Explanation generation failed: {}", e);
                format!("The correct answer is: {}", correct)
            }
        }
    }
}

/// Fallback questions, one per dialogue window, for use without a model.
pub fn placeholder_questions(lines: &[TranscriptLine], window_secs: f64, max_questions: usize) -> Vec<QuizQuestion> {
    group_lines(lines, window_secs)
        .iter()
        .map(|group| build_dialogue(group, window_secs))
        .filter(|dialogue| !dialogue.is_empty())
        .take(max_questions)
        .enumerate()
        .map(|(i, dialogue)| {
            QuizQuestion::fallback(format!("q{}", i + 1), dialogue.format())
                .with_source_segment(dialogue.source)
        })
        .collect()
}

/// Validated dialogue reply.
struct ValidReply {
    question: String,
    options: [String; OPTION_COUNT],
    correct_index: usize,
}

fn parse_dialogue_reply(raw: &str) -> Option<ValidReply> {
    let body = strip_code_fences(raw);
    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if end < start {
        return None;
    }

    let reply: DialogueReply = serde_json::from_str(&body[start..=end]).ok()?;
    let options: [String; OPTION_COUNT] = reply.options.try_into().ok()?;
    (reply.correct_index < OPTION_COUNT && !reply.question.trim().is_empty()).then_some(ValidReply {
        question: reply.question,
        options,
        correct_index: reply.correct_index,
    })
}

/// Exactly four distinct options containing the correct answer.
///
/// The answer keeps its position when the model listed it; otherwise it
/// replaces the first option. Fewer than four distinct options is unusable.
fn arrange_options(choices: ChoiceSet) -> Option<([String; OPTION_COUNT], usize)> {
    let correct = choices.correct_answer.trim().to_string();

    let mut options: Vec<String> = Vec::with_capacity(OPTION_COUNT);
    for option in choices.options {
        let option = option.trim().to_string();
        if !option.is_empty() && !options.contains(&option) {
            options.push(option);
        }
    }

    let correct_index = match options.iter().position(|o| *o == correct) {
        Some(i) if i < OPTION_COUNT => i,
        Some(i) => {
            options.remove(i);
            options.insert(0, correct);
            0
        }
        None => {
            options.insert(0, correct);
            0
        }
    };

    options.truncate(OPTION_COUNT);
    let options: [String; OPTION_COUNT] = options.try_into().ok()?;
    Some((options, correct_index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::test_support::ScriptedGenerator;

    fn choices(correct: &str, options: &[&str]) -> ChoiceSet {
        ChoiceSet {
            correct_answer: correct.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
        }
    }

    #[test]
    fn test_arrange_options() {
        let (options, index) = arrange_options(choices("b", &["a", "b", "c", "d"])).unwrap();
        assert_eq!(index, 1);
        assert_eq!(options[1], "b");

        let (options, index) = arrange_options(choices("x", &["a", "b", "c", "d"])).unwrap();
        assert_eq!(index, 0);
        assert_eq!(options, ["x", "a", "b", "c"].map(String::from));

        let (options, index) = arrange_options(choices("e", &["a", "b", "c", "d", "e"])).unwrap();
        assert_eq!(index, 0);
        assert_eq!(options[0], "e");

        assert!(arrange_options(choices("a", &["a", "a", "b"])).is_none());
    }

    #[test]
    fn test_parse_dialogue_reply() {
        let raw = "```json\n{\"question\": \"Where are they?\", \"options\": [\"a\", \"b\", \"c\", \"d\"], \"correct_index\": 2}\n```";
        let reply = parse_dialogue_reply(raw).unwrap();
        assert_eq!(reply.correct_index, 2);
        assert_eq!(reply.options[2], "c");

        assert!(parse_dialogue_reply(r#"{"question": "q", "options": ["a"], "correct_index": 0}"#).is_none());
        assert!(parse_dialogue_reply(r#"{"question": "q", "options": ["a","b","c","d"], "correct_index": 4}"#).is_none());
    }

    #[tokio::test]
    async fn test_from_cases() {
        let generator = Arc::new(ScriptedGenerator::replying(&[
            r#"{"correct_answer": "バス", "options": ["電車", "バス", "タクシー", "自転車"]}"#,
            "The woman says she will take the bus.",
            "no json here",
        ]));
        let builder = QuizBuilder::new(generator);
        let cases = vec![
            ListeningCase {
                situation: "駅で".to_string(),
                conversation: "女：バスで行きます".to_string(),
                question: "女の人は何で行きますか".to_string(),
            },
            ListeningCase {
                situation: "店で".to_string(),
                conversation: "c".to_string(),
                question: "q".to_string(),
            },
        ];

        let questions = builder.from_cases(&cases).await;
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].correct_answer(), "バス");
        assert_eq!(questions[0].explanation, "The woman says she will take the bus.");
        assert_eq!(questions[0].passage, "駅で\n\n女：バスで行きます");
        assert_eq!(questions[1].prompt, QuizQuestion::fallback("q2", "").prompt);
        assert_eq!(questions[1].id, "q2");
    }

    #[tokio::test]
    async fn test_from_dialogues_falls_back_when_model_fails() {
        let lines: Vec<TranscriptLine> = (0..4)
            .map(|i| TranscriptLine::new("はい、そうです。", i as f64 * 20.0, 20.0))
            .collect();

        let builder = QuizBuilder::new(Arc::new(ScriptedGenerator::failing())).with_max_questions(5);
        let questions = builder.from_dialogues(&lines, 30.0).await;

        assert_eq!(questions.len(), 2);
        assert!(questions.iter().all(|q| q.correct_index == 0));
        assert_eq!(questions[1].source_segment.as_ref().unwrap().start, 40.0);
        assert!(questions[0].passage.starts_with("A: はい、そうです。"));
    }

    #[test]
    fn test_placeholder_questions() {
        let lines: Vec<TranscriptLine> = (0..9)
            .map(|i| TranscriptLine::new("そうですね。", i as f64 * 10.0, 10.0))
            .collect();
        let questions = placeholder_questions(&lines, 30.0, 2);
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[1].id, "q2");
        assert_eq!(questions[1].source_segment.as_ref().unwrap().start, 30.0);
    }

    #[tokio::test]
    async fn test_from_dialogues_uses_model_reply() {
        let generator = Arc::new(ScriptedGenerator::replying(&[
            r#"{"question": "What does B want?", "options": ["tea", "coffee", "water", "juice"], "correct_index": 1}"#,
            "B asks for coffee.",
        ]));
        let builder = QuizBuilder::new(generator).with_max_questions(1);
        let lines = vec![TranscriptLine::new("何にしますか。コーヒーをください。", 0.0, 40.0)];

        let questions = builder.from_dialogues(&lines, 30.0).await;
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].correct_answer(), "coffee");
        assert_eq!(questions[0].explanation, "B asks for coffee.");
    }
}
