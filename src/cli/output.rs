//! CLI output formatting utilities.

use crate::index::SearchHit;
use crate::quiz::QuizQuestion;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print an indexed video.
    pub fn video_info(id: &str, level: Option<&str>, segments: u32, indexed_at: &str) {
        println!(
            "  {} {} ({}, {} sections, {})",
            style("*").cyan(),
            style(id).bold(),
            level.unwrap_or("no level"),
            segments,
            style(indexed_at).dim()
        );
    }

    /// Print a search hit.
    pub fn search_result(hit: &SearchHit) {
        let segment = &hit.segment;
        println!(
            "\n{} {} [{}] (score: {:.2})",
            style(">>").green(),
            style(&segment.metadata.video_id).bold(),
            style(segment.section).cyan(),
            hit.similarity
        );
        println!("   {}", content_preview(&segment.text, 200));
    }

    /// Print a quiz question with numbered options.
    pub fn question(number: usize, total: usize, question: &QuizQuestion) {
        println!(
            "\n{} {}",
            style(format!("[{}/{}]", number, total)).cyan().bold(),
            style(&question.prompt).bold()
        );
        if !question.passage.is_empty() {
            for line in question.passage.lines().filter(|l| !l.trim().is_empty()) {
                println!("   {}", style(line).dim());
            }
        }
        for (i, option) in question.options.iter().enumerate() {
            println!("   {}. {}", i + 1, option);
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Truncate content with ellipsis, on a character boundary.
pub(crate) fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let truncated: String = content.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}
