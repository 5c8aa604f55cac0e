//! Kikitori - Japanese listening practice
//!
//! A local-first CLI tool and library that turns JLPT listening videos into
//! searchable sections and multiple-choice quizzes.
//!
//! The name "Kikitori" (聞き取り) is Japanese for "listening comprehension."
//!
//! # Overview
//!
//! Kikitori allows you to:
//! - Fetch timed YouTube transcripts
//! - Split a transcript into introduction, conversation, and questions
//! - Search indexed sections semantically
//! - Extract situation / conversation / question cases with a generative model
//! - Practice with a multiple-choice quiz
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `transcript` - Transcript sources and storage
//! - `segmentation` - Section splitting policies
//! - `embedding` - Embedding generation
//! - `index` - Semantic index over sections
//! - `generation` - Generative model backends
//! - `extraction` - Structured case extraction
//! - `quiz` - Question building, caching, and the quiz engine
//! - `session` - Per-user study state
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use kikitori::config::Settings;
//! use kikitori::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let video = orchestrator.resolve_video("N4")?;
//!     let result = orchestrator.index_video(&video, false).await?;
//!     println!("Indexed {} sections", result.sections_indexed);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extraction;
pub mod generation;
pub mod index;
pub mod openai;
pub mod orchestrator;
pub mod quiz;
pub mod segmentation;
pub mod session;
pub mod transcript;

pub use error::{KikitoriError, Result};

use std::time::Duration;

/// HTTP client with a request timeout.
///
/// Falls back to reqwest's default client if the builder rejects the configuration.
pub fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to build HTTP client with timeout: {}", e);
            reqwest::Client::new()
        })
}
