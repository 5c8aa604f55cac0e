//! Index command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::KikitoriError;
use anyhow::Result;

/// Run the index command.
pub async fn run_index(input: &str, force: bool, settings: Settings) -> Result<()> {
    preflight::check(Operation::Embed, &settings)?;

    let orchestrator = Orchestrator::new(settings)?;
    let video = orchestrator.resolve_video(input)?;

    let spinner = Output::spinner(&format!("Indexing {}...", video.video_id));
    let result = orchestrator.index_video(&video, force).await;
    spinner.finish_and_clear();

    match result {
        Ok(result) if result.skipped => {
            Output::info(&format!(
                "{} is already indexed. Use --force to index it again.",
                result.video_id
            ));
        }
        Ok(result) => {
            Output::success(&format!(
                "Indexed {} sections for {}",
                result.sections_indexed, result.video_id
            ));
        }
        Err(KikitoriError::TranscriptUnavailable(id)) => {
            Output::warning(&format!("No transcript available for {}", id));
        }
        Err(e) => {
            Output::error(&format!("Indexing failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
