//! Configuration settings for Kikitori.

use crate::segmentation::SegmentationPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub transcript: TranscriptSettings,
    pub segmentation: SegmentationSettings,
    pub embedding: EmbeddingSettings,
    pub index: IndexSettings,
    pub generation: GenerationSettings,
    pub quiz: QuizSettings,
    pub library: LibrarySettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for transcripts, quiz caches, and the index.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.kikitori".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Transcript download settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptSettings {
    /// Subtitle languages in order of preference.
    pub languages: Vec<String>,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            languages: vec!["ja".to_string(), "en".to_string()],
        }
    }
}

/// Transcript segmentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationSettings {
    /// Active policy (time_ratio, sentence_count).
    pub policy: SegmentationPolicy,
    /// Fraction of the duration treated as introduction.
    pub introduction_ratio: f64,
    /// Fraction of the duration at which the questions begin.
    pub conversation_end_ratio: f64,
    /// Leading lines treated as introduction (sentence_count).
    pub introduction_lines: usize,
    /// Trailing lines treated as questions (sentence_count).
    pub question_lines: usize,
}

impl Default for SegmentationSettings {
    fn default() -> Self {
        Self {
            policy: SegmentationPolicy::TimeRatio,
            introduction_ratio: 0.2,
            conversation_end_ratio: 0.7,
            introduction_lines: 3,
            question_lines: 3,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Semantic index settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Index backend (sqlite, memory).
    pub provider: String,
    /// Path to the SQLite database (sqlite provider).
    pub sqlite_path: String,
    /// Default number of search results.
    pub top_k: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            provider: "sqlite".to_string(),
            sqlite_path: "~/.kikitori/index.db".to_string(),
            top_k: 5,
        }
    }
}

/// Generative model provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GenerationProvider {
    /// Google Gemini via the generateContent REST API.
    #[default]
    Gemini,
    /// OpenAI chat completions.
    OpenAI,
}

impl std::str::FromStr for GenerationProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Ok(GenerationProvider::Gemini),
            "openai" => Ok(GenerationProvider::OpenAI),
            _ => Err(format!("Unknown generation provider: {}", s)),
        }
    }
}

impl std::fmt::Display for GenerationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationProvider::Gemini => write!(f, "gemini"),
            GenerationProvider::OpenAI => write!(f, "openai"),
        }
    }
}

/// Generative model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub provider: GenerationProvider,
    /// Model name for the selected provider.
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// API key for Gemini. Falls back to GOOGLE_API_KEY.
    pub api_key: Option<String>,
    /// HTTP timeout for model calls.
    pub timeout_seconds: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            provider: GenerationProvider::Gemini,
            model: "gemini-2.0-flash".to_string(),
            temperature: 0.7,
            max_output_tokens: 2048,
            api_key: None,
            timeout_seconds: 120,
        }
    }
}

impl GenerationSettings {
    /// Gemini API key from config or the environment.
    pub fn gemini_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok().filter(|k| !k.is_empty()))
    }
}

/// How quiz questions are produced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuizStrategy {
    /// Extract situation/conversation/question cases, then generate choices.
    #[default]
    Cases,
    /// Group lines into short two-speaker dialogues and ask one question each.
    Dialogue,
}

impl std::str::FromStr for QuizStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cases" | "extraction" => Ok(QuizStrategy::Cases),
            "dialogue" | "dialogues" => Ok(QuizStrategy::Dialogue),
            _ => Err(format!("Unknown quiz strategy: {}", s)),
        }
    }
}

/// Quiz generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizSettings {
    pub strategy: QuizStrategy,
    /// Minimum dialogue length in seconds (dialogue strategy).
    pub dialogue_seconds: f64,
    /// Maximum questions per quiz.
    pub max_questions: usize,
    /// Cache generated quizzes as JSON in the data directory.
    pub cache: bool,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            strategy: QuizStrategy::Cases,
            dialogue_seconds: 30.0,
            max_questions: 5,
            cache: true,
        }
    }
}

/// Preset practice videos keyed by JLPT level.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    pub videos: BTreeMap<String, String>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        let videos = [
            ("N5", "sY7L5cfCWno"),
            ("N4", "F4sqJAPyB4o"),
            ("N3", "lasKN-LsJwQ"),
        ]
        .into_iter()
        .map(|(level, id)| (level.to_string(), id.to_string()))
        .collect();

        Self { videos }
    }
}

impl LibrarySettings {
    /// Video ID for a level such as "N3" or "JLPT N3".
    pub fn video_for_level(&self, level: &str) -> Option<&str> {
        let key = level.trim().to_uppercase();
        let key = key.trim_start_matches("JLPT").trim();
        self.videos.get(key).map(|s| s.as_str())
    }

    /// Level whose preset is this video, if any.
    pub fn level_for_video(&self, video_id: &str) -> Option<&str> {
        self.videos
            .iter()
            .find(|(_, id)| id.as_str() == video_id)
            .map(|(level, _)| level.as_str())
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::KikitoriError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kikitori")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Directory holding saved transcripts.
    pub fn transcripts_dir(&self) -> PathBuf {
        self.data_dir().join("transcripts")
    }

    /// Directory holding cached quizzes.
    pub fn quizzes_dir(&self) -> PathBuf {
        self.data_dir().join("quizzes")
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.index.sqlite_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.segmentation.policy, SegmentationPolicy::TimeRatio);
        assert_eq!(settings.generation.provider, GenerationProvider::Gemini);
        assert_eq!(settings.index.top_k, 5);
    }

    #[test]
    fn test_partial_toml() {
        let settings: Settings = toml::from_str(
            r#"
            [segmentation]
            policy = "sentence_count"
            question_lines = 2

            [generation]
            provider = "openai"
            model = "gpt-4o-mini"
            "#,
        )
        .unwrap();

        assert_eq!(settings.segmentation.policy, SegmentationPolicy::SentenceCount);
        assert_eq!(settings.segmentation.question_lines, 2);
        assert_eq!(settings.segmentation.introduction_lines, 3);
        assert_eq!(settings.generation.provider, GenerationProvider::OpenAI);
        assert_eq!(settings.quiz.max_questions, 5);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.quiz.max_questions = 8;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.quiz.max_questions, 8);
    }

    #[test]
    fn test_library_lookup() {
        let library = LibrarySettings::default();
        assert_eq!(library.video_for_level("n3"), Some("lasKN-LsJwQ"));
        assert_eq!(library.video_for_level("JLPT N5"), Some("sY7L5cfCWno"));
        assert_eq!(library.video_for_level("N1"), None);
        assert_eq!(library.level_for_video("F4sqJAPyB4o"), Some("N4"));
    }
}
