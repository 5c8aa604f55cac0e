//! Text generation backends.
//!
//! Extraction and quiz building only need "prompt in, text out", so both the
//! Gemini REST API and OpenAI chat completions sit behind [`TextGenerator`].

mod gemini;
mod openai;

pub use gemini::GeminiGenerator;
pub use openai::OpenAIGenerator;

use crate::config::{GenerationProvider, GenerationSettings};
use crate::error::{KikitoriError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for generative model backends.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Complete a prompt, with an optional system instruction.
    async fn complete(&self, system: Option<&str>, prompt: &str) -> Result<String>;

    /// Model identifier, for logging.
    fn model(&self) -> &str;
}

/// Create the generator selected by the settings.
///
/// Fails when the selected provider has no API key configured.
pub fn create_generator(settings: &GenerationSettings) -> Result<Arc<dyn TextGenerator>> {
    match settings.provider {
        GenerationProvider::Gemini => {
            let api_key = settings.gemini_api_key().ok_or_else(|| {
                KikitoriError::Config(
                    "Gemini API key not set. Set GOOGLE_API_KEY or generation.api_key".to_string(),
                )
            })?;
            Ok(Arc::new(GeminiGenerator::new(api_key, settings)))
        }
        GenerationProvider::OpenAI => {
            if !crate::openai::is_api_key_configured() {
                return Err(KikitoriError::Config("OPENAI_API_KEY not set".to_string()));
            }
            Ok(Arc::new(OpenAIGenerator::new(settings)))
        }
    }
}

/// Strip a surrounding Markdown code fence, if any.
///
/// Models often wrap JSON in ```json ... ``` even when told not to.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string ("json") on the opening line.
    let body = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };

    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fences("```\n{\"a\": 1}\n```  "), "{\"a\": 1}");
        assert_eq!(strip_code_fences("  [1]  "), "[1]");
        assert_eq!(strip_code_fences("```json\n[1"), "[1");
    }

    #[test]
    fn test_create_generator_with_configured_key() {
        let settings = GenerationSettings {
            provider: GenerationProvider::Gemini,
            api_key: Some("test-key".to_string()),
            ..GenerationSettings::default()
        };
        let generator = create_generator(&settings).unwrap();
        assert_eq!(generator.model(), "gemini-2.0-flash");
    }

    #[test]
    fn test_create_generator_without_key_fails() {
        std::env::remove_var("GOOGLE_API_KEY");

        let settings = GenerationSettings {
            provider: GenerationProvider::Gemini,
            api_key: Some(String::new()),
            ..GenerationSettings::default()
        };
        let result = create_generator(&settings);
        assert!(matches!(result, Err(KikitoriError::Config(_))));
    }
}
