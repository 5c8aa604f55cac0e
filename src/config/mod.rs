//! Configuration module for Kikitori.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{ExtractionPrompts, Prompts, QuizPrompts};
pub use settings::{
    EmbeddingSettings, GeneralSettings, GenerationProvider, GenerationSettings, IndexSettings,
    LibrarySettings, PromptSettings, QuizSettings, QuizStrategy, SegmentationSettings, Settings,
    TranscriptSettings,
};
