//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::{GenerationProvider, Settings};
use crate::error::{KikitoriError, Result};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Fetching transcripts requires yt-dlp.
    Fetch,
    /// Indexing and searching require the embeddings API key.
    Embed,
    /// Extraction requires a generation API key.
    Generate,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Fetch => check_tool("yt-dlp"),
        Operation::Embed => check_openai_key(),
        Operation::Generate => match settings.generation.provider {
            GenerationProvider::Gemini => check_gemini_key(settings),
            GenerationProvider::OpenAI => check_openai_key(),
        },
    }
}

fn check_openai_key() -> Result<()> {
    if crate::openai::is_api_key_configured() {
        Ok(())
    } else {
        Err(KikitoriError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        ))
    }
}

fn check_gemini_key(settings: &Settings) -> Result<()> {
    settings.generation.gemini_api_key().map(|_| ()).ok_or_else(|| {
        KikitoriError::Config(
            "GOOGLE_API_KEY not set. Set it with: export GOOGLE_API_KEY='...' or set generation.api_key"
                .to_string(),
        )
    })
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(KikitoriError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(KikitoriError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(KikitoriError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_gemini_key_passes() {
        let mut settings = Settings::default();
        settings.generation.api_key = Some("key".to_string());
        assert!(check(Operation::Generate, &settings).is_ok());
    }

    #[test]
    fn test_missing_tool_is_reported() {
        let result = check_tool("kikitori-no-such-tool");
        assert!(matches!(result, Err(KikitoriError::ToolNotFound(_))));
    }
}
