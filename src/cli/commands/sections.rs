//! Sections command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::segmentation::SegmentationPolicy;
use crate::transcript::format_timestamp;
use anyhow::Result;

/// Run the sections command.
pub async fn run_sections(input: &str, policy: Option<&str>, mut settings: Settings) -> Result<()> {
    if let Some(policy) = policy {
        settings.segmentation.policy = policy
            .parse::<SegmentationPolicy>()
            .map_err(|e| anyhow::anyhow!(e))?;
    }

    let orchestrator = Orchestrator::new(settings)?;
    let video = orchestrator.resolve_video(input)?;

    let transcript = match orchestrator.load_transcript(&video.video_id, false).await {
        Ok(transcript) => transcript,
        Err(e) => {
            Output::warning(&format!("No transcript available for {}: {}", video.video_id, e));
            return Ok(());
        }
    };

    let sections = orchestrator.segment(&transcript);
    if sections.is_empty() {
        Output::warning("Transcript has no lines.");
        return Ok(());
    }

    Output::info(&format!(
        "Policy: {}",
        orchestrator.settings().segmentation.policy
    ));

    for section in &sections {
        Output::header(&format!("{} ({} lines)", section.kind, section.len()));
        for line in &section.lines {
            println!("  [{}] {}", format_timestamp(line.start), line.text);
        }
    }

    Ok(())
}
