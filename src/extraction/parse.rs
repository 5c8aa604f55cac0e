//! Parsing of model output into listening cases.
//!
//! Model JSON is unreliable: it arrives fenced, wrapped in prose, wrapped in an
//! object, or cut off mid-string. The strict path deserializes; the fallback
//! pulls quoted field values out with a regex.

use super::{ChoiceSet, ExtractionSource, ListeningCase};
use crate::generation::strip_code_fences;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::debug;

/// Shapes the model is known to answer with.
#[derive(Deserialize)]
#[serde(untagged)]
enum CasePayload {
    Many(Vec<ListeningCase>),
    Wrapped { cases: Vec<ListeningCase> },
    One(ListeningCase),
}

impl CasePayload {
    fn into_cases(self) -> Vec<ListeningCase> {
        match self {
            CasePayload::Many(cases) | CasePayload::Wrapped { cases } => cases,
            CasePayload::One(case) => vec![case],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Situation,
    Conversation,
    Question,
}

/// Turns raw model output into cases.
pub struct CaseParser {
    field_regex: Regex,
}

impl Default for CaseParser {
    fn default() -> Self {
        Self::new()
    }
}

impl CaseParser {
    pub fn new() -> Self {
        Self {
            field_regex: Regex::new(
                r#"(?i)"(situation[ _]description|situation|introduction|full[ _]conversation[ _]details|conversation|specific[ _]question|question)"\s*:\s*"((?:[^"\\]|\\.)*)""#,
            )
            .expect("Invalid regex"),
        }
    }

    /// Parse model output, strictly first and by regex otherwise.
    ///
    /// Cases with every field empty are dropped and duplicates removed.
    pub fn parse(&self, raw: &str) -> (Vec<ListeningCase>, ExtractionSource) {
        let (cases, source) = match parse_strict(raw) {
            Some(cases) => (cases, ExtractionSource::Parsed),
            None => {
                debug!("Strict parse failed, using field fallback");
                (self.parse_fields(raw), ExtractionSource::Fallback)
            }
        };

        (dedup_cases(cases), source)
    }

    /// Collect every quoted field value in order and zip them by position.
    pub fn parse_fields(&self, raw: &str) -> Vec<ListeningCase> {
        let mut situations = Vec::new();
        let mut conversations = Vec::new();
        let mut questions = Vec::new();

        for caps in self.field_regex.captures_iter(raw) {
            let value = unescape(&caps[2]);
            match field_for_key(&caps[1]) {
                Field::Situation => situations.push(value),
                Field::Conversation => conversations.push(value),
                Field::Question => questions.push(value),
            }
        }

        let count = situations.len().max(conversations.len()).max(questions.len());
        (0..count)
            .map(|i| ListeningCase {
                situation: situations.get(i).cloned().unwrap_or_default(),
                conversation: conversations.get(i).cloned().unwrap_or_default(),
                question: questions.get(i).cloned().unwrap_or_default(),
            })
            .collect()
    }
}

fn field_for_key(key: &str) -> Field {
    let key = key.to_lowercase();
    if key.contains("conversation") {
        Field::Conversation
    } else if key.contains("question") {
        Field::Question
    } else {
        Field::Situation
    }
}

/// Decode JSON string escapes, keeping the raw text when that fails.
fn unescape(value: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{}\"", value)).unwrap_or_else(|_| value.to_string())
}

/// Deserialize the whole payload, then the outermost array, then the outermost object.
///
/// A payload counts only when every object in it carries at least one known
/// field; anything else is left to the field fallback.
fn parse_strict(raw: &str) -> Option<Vec<ListeningCase>> {
    let body = strip_code_fences(raw);

    if let Some(cases) = serde_json::from_str::<CasePayload>(body)
        .ok()
        .and_then(|payload| validated(payload.into_cases()))
    {
        return Some(cases);
    }

    if let Some(cases) = outermost(body, '[', ']')
        .and_then(|array| serde_json::from_str::<Vec<ListeningCase>>(array).ok())
        .and_then(validated)
    {
        return Some(cases);
    }

    // An array that failed to parse must not be rescued by its first element.
    let object_start = body.find('{')?;
    if body.find('[').is_some_and(|i| i < object_start) {
        return None;
    }

    let object = outermost(body, '{', '}')?;
    serde_json::from_str::<CasePayload>(object)
        .ok()
        .and_then(|payload| validated(payload.into_cases()))
}

/// Reject payloads whose objects matched none of the case fields.
fn validated(cases: Vec<ListeningCase>) -> Option<Vec<ListeningCase>> {
    (!cases.iter().any(ListeningCase::is_empty)).then_some(cases)
}

fn outermost(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

/// Drop empty cases and repeats, keeping first occurrences in order.
pub fn dedup_cases(cases: Vec<ListeningCase>) -> Vec<ListeningCase> {
    let mut seen = HashSet::new();
    cases
        .into_iter()
        .filter(|case| !case.is_empty())
        .filter(|case| seen.insert(case.dedup_key()))
        .collect()
}

/// Parse a `{"correct_answer": ..., "options": [...]}` reply.
pub fn parse_choices(raw: &str) -> Option<ChoiceSet> {
    let body = strip_code_fences(raw);
    let choices = serde_json::from_str::<ChoiceSet>(body)
        .ok()
        .or_else(|| serde_json::from_str::<ChoiceSet>(outermost(body, '{', '}')?).ok())?;

    (!choices.correct_answer.trim().is_empty() && !choices.options.is_empty()).then_some(choices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(s: &str, c: &str, q: &str) -> ListeningCase {
        ListeningCase {
            situation: s.to_string(),
            conversation: c.to_string(),
            question: q.to_string(),
        }
    }

    #[test]
    fn test_parse_fenced_array() {
        let raw = "Here you go:\n```json\n[{\"situation\": \"駅で\", \"conversation\": \"A: すみません\", \"question\": \"どこへ行きますか\"}]\n```";
        let (cases, source) = CaseParser::new().parse(raw);
        assert_eq!(source, ExtractionSource::Parsed);
        assert_eq!(cases, vec![case("駅で", "A: すみません", "どこへ行きますか")]);
    }

    #[test]
    fn test_parse_aliases_and_shapes() {
        let parser = CaseParser::new();

        let raw = r#"{"Situation description": "店で", "Full conversation details": "会話", "Specific question": "何を買いますか"}"#;
        let (cases, source) = parser.parse(raw);
        assert_eq!(source, ExtractionSource::Parsed);
        assert_eq!(cases, vec![case("店で", "会話", "何を買いますか")]);

        let raw = r#"{"cases": [{"introduction": "学校で", "conversation": "c", "question": "q"}]}"#;
        let (cases, _) = parser.parse(raw);
        assert_eq!(cases, vec![case("学校で", "c", "q")]);
    }

    #[test]
    fn test_truncated_json_uses_fallback() {
        let raw = r#"[{"situation": "駅で", "conversation": "A: \"はい\"", "question": "何時ですか"},
                      {"situation": "店で", "conversation": "B: いらっしゃ"#;
        let (cases, source) = CaseParser::new().parse(raw);
        assert_eq!(source, ExtractionSource::Fallback);
        assert_eq!(
            cases,
            vec![case("駅で", "A: \"はい\"", "何時ですか"), case("店で", "", "")]
        );
    }

    #[test]
    fn test_unknown_keys_use_fallback() {
        let parser = CaseParser::new();

        let raw = r#"[{"Situation": "駅で", "Conversation": "A: はい", "Question": "どこへ行きますか"}]"#;
        let (cases, source) = parser.parse(raw);
        assert_eq!(source, ExtractionSource::Fallback);
        assert_eq!(cases, vec![case("駅で", "A: はい", "どこへ行きますか")]);

        let raw = r#"{"situation_description": "店で", "full_conversation_details": "会話", "specific_question": "何を買いますか"}"#;
        let (cases, source) = parser.parse(raw);
        assert_eq!(source, ExtractionSource::Fallback);
        assert_eq!(cases, vec![case("店で", "会話", "何を買いますか")]);

        let (cases, source) = parser.parse(r#"{"result": "none"}"#);
        assert_eq!(source, ExtractionSource::Fallback);
        assert!(cases.is_empty());
    }

    #[test]
    fn test_empty_array_is_parsed() {
        let (cases, source) = CaseParser::new().parse("[]");
        assert_eq!(source, ExtractionSource::Parsed);
        assert!(cases.is_empty());
    }

    #[test]
    fn test_garbage_yields_nothing() {
        let (cases, source) = CaseParser::new().parse("I could not find any cases.");
        assert_eq!(source, ExtractionSource::Fallback);
        assert!(cases.is_empty());
    }

    #[test]
    fn test_dedup_and_empty_filtering() {
        let cases = vec![
            case("a", "b", "c"),
            case("", "", ""),
            case("a", "b", "c"),
            case("", "", "only question"),
        ];
        assert_eq!(
            dedup_cases(cases),
            vec![case("a", "b", "c"), case("", "", "only question")]
        );
    }

    #[test]
    fn test_parse_choices() {
        let raw = "```json\n{\"correct_answer\": \"りんご\", \"options\": [\"りんご\", \"みかん\", \"ぶどう\", \"もも\"]}\n```";
        let choices = parse_choices(raw).unwrap();
        assert_eq!(choices.correct_answer, "りんご");
        assert_eq!(choices.options.len(), 4);

        assert!(parse_choices("{\"correct_answer\": \"\", \"options\": []}").is_none());
        assert!(parse_choices("not json").is_none());
    }
}
