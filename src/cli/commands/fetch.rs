//! Fetch command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::transcript::format_timestamp;
use anyhow::Result;

/// Run the fetch command.
pub async fn run_fetch(input: &str, force: bool, show: bool, settings: Settings) -> Result<()> {
    preflight::check(Operation::Fetch, &settings)?;

    let orchestrator = Orchestrator::new(settings)?;
    let video = orchestrator.resolve_video(input)?;

    let spinner = Output::spinner(&format!("Fetching transcript for {}...", video.video_id));
    let result = orchestrator.load_transcript(&video.video_id, force).await;
    spinner.finish_and_clear();

    match result {
        Ok(transcript) => {
            Output::success(&format!(
                "Saved {} lines ({})",
                transcript.lines.len(),
                format_timestamp(transcript.total_duration())
            ));
            Output::kv(
                "File",
                &orchestrator.transcripts().path_for(&video.video_id).display().to_string(),
            );
            if show {
                println!("\n{}", transcript.format_with_timestamps());
            }
        }
        Err(e) => {
            Output::warning(&format!("No transcript available for {}: {}", video.video_id, e));
        }
    }

    Ok(())
}
