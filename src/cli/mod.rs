//! CLI module for Kikitori.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Kikitori - Japanese listening practice
///
/// Turns JLPT listening videos into searchable sections and multiple-choice quizzes.
/// The name "Kikitori" (聞き取り) means "listening comprehension."
#[derive(Parser, Debug)]
#[command(name = "kikitori")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "KIKITORI_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download and save a video's transcript
    Fetch {
        /// JLPT level (N5, N4, N3), YouTube URL, or video ID
        video: String,

        /// Download again even if a transcript is saved
        #[arg(short, long)]
        force: bool,

        /// Print the transcript with timestamps
        #[arg(long)]
        show: bool,
    },

    /// Show the introduction, conversation, and questions of a transcript
    Sections {
        /// JLPT level, YouTube URL, or video ID
        video: String,

        /// Segmentation policy (time_ratio, sentence_count)
        #[arg(short, long)]
        policy: Option<String>,
    },

    /// Index a video's sections for semantic search
    Index {
        /// JLPT level, YouTube URL, or video ID
        video: String,

        /// Index again even if the video is already indexed
        #[arg(short, long)]
        force: bool,
    },

    /// Search indexed sections
    Search {
        /// Search query
        query: String,

        /// Section to search (all, introduction, conversation, questions)
        #[arg(short, long, default_value = "all")]
        section: String,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Extract situation, conversation, and question cases
    Extract {
        /// JLPT level, YouTube URL, or video ID
        video: String,

        /// Print the cases as JSON
        #[arg(long)]
        json: bool,

        /// Generation provider (gemini, openai)
        #[arg(short, long)]
        provider: Option<String>,
    },

    /// Take a multiple-choice listening quiz
    Quiz {
        /// JLPT level, YouTube URL, or video ID
        video: String,

        /// Ignore the cached quiz and build a new one
        #[arg(short, long)]
        rebuild: bool,

        /// Question strategy (cases, dialogue)
        #[arg(short, long)]
        strategy: Option<String>,
    },

    /// List indexed videos
    List,

    /// Remove every indexed section
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the default configuration file if none exists
    Init,

    /// Show configuration file path
    Path,
}
