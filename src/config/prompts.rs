//! Prompt templates for Kikitori.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    pub extraction: ExtractionPrompts,
    pub quiz: QuizPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for structured case extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionPrompts {
    pub system: String,
    pub user: String,
}

impl Default for ExtractionPrompts {
    fn default() -> Self {
        Self {
            system: r#"You analyze transcripts of JLPT listening comprehension videos. Each video contains several test items. Every item introduces a situation, plays a conversation, and asks a question about it.

Respond with JSON only. Do not add commentary before or after the JSON."#
                .to_string(),

            user: r#"Analyze the entire transcript and systematically extract information for EACH CONVERSATION CASE.

For each case, provide:
- "situation": the situation description read before the conversation
- "conversation": the full conversation, in Japanese
- "question": the specific question to be answered

Return the result as a valid JSON array, for example:
[
  {"situation": "男の人と女の人が話しています。", "conversation": "男：...\n女：...", "question": "女の人はこのあと何をしますか。"}
]

Transcript:
{{transcript}}"#
                .to_string(),
        }
    }
}

/// Prompts for multiple-choice question generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizPrompts {
    /// Options for an extracted case.
    pub choices: String,
    /// System prompt for dialogue-based questions.
    pub dialogue_system: String,
    /// User prompt for dialogue-based questions.
    pub dialogue_user: String,
    /// One-sentence explanation of the correct answer.
    pub explanation: String,
}

impl Default for QuizPrompts {
    fn default() -> Self {
        Self {
            choices: r#"Based on the following Japanese listening comprehension case, generate multiple-choice options.

Situation: {{situation}}
Conversation: {{conversation}}
Specific Question: {{question}}

Instructions:
1. Create 4 multiple-choice options for the specific question in Japanese
2. Ensure the correct answer is derived from the conversation
3. Make the other options plausible but incorrect
4. Format the response as JSON with the following structure:
{
    "correct_answer": "...",
    "options": ["option1", "option2", "option3", "option4"]
}"#
            .to_string(),

            dialogue_system: r#"You are a Japanese language teaching assistant. Generate a multiple-choice question in English about the following Japanese conversation. The question should test the listener's comprehension of the main topic or key details. Include 4 answer choices where only one is correct. Format your response as a JSON object with "question", "options" (array), and "correct_index" (0-3) fields. Only return the JSON object, no other text."#
                .to_string(),

            dialogue_user: "Conversation in Japanese:\n{{conversation}}".to_string(),

            explanation: r#"Explain why the correct answer is right and the others are wrong in one concise sentence. Return only the explanation, no other text.

Question: {{question}}
Correct answer: {{correct_answer}}
Other options: {{other_options}}"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let extraction_path = custom_path.join("extraction.toml");
            if extraction_path.exists() {
                let content = std::fs::read_to_string(&extraction_path)?;
                prompts.extraction = toml::from_str(&content)?;
            }

            let quiz_path = custom_path.join("quiz.toml");
            if quiz_path.exists() {
                let content = std::fs::read_to_string(&quiz_path)?;
                prompts.quiz = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render with both provided variables and custom config variables.
    /// Provided variables take precedence.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.extraction.user.contains("{{transcript}}"));
        assert!(prompts.quiz.choices.contains("{{situation}}"));
    }

    #[test]
    fn test_render_keeps_json_braces() {
        let prompts = Prompts::default();
        let mut vars = HashMap::new();
        vars.insert("situation".to_string(), "駅で".to_string());
        vars.insert("conversation".to_string(), "A: すみません".to_string());
        vars.insert("question".to_string(), "どこへ行きますか".to_string());

        let rendered = prompts.render_with_custom(&prompts.quiz.choices, &vars);
        assert!(rendered.contains("Situation: 駅で"));
        assert!(rendered.contains("\"correct_answer\""));
        assert!(!rendered.contains("{{"));
    }

    #[test]
    fn test_custom_variables_are_overridden() {
        let mut custom = HashMap::new();
        custom.insert("level".to_string(), "N3".to_string());
        custom.insert("name".to_string(), "default".to_string());
        let prompts = Prompts::load(None, Some(&custom)).unwrap();

        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "override".to_string());
        assert_eq!(prompts.render_with_custom("{{level}} {{name}}", &vars), "N3 override");
    }

    #[test]
    fn test_load_custom_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("extraction.toml"),
            "user = \"Cases please: {{transcript}}\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.extraction.user, "Cases please: {{transcript}}");
        assert!(!prompts.extraction.system.is_empty());
    }
}
