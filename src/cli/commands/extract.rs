//! Extract command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::extraction::ExtractionSource;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the extract command.
pub async fn run_extract(
    input: &str,
    json: bool,
    provider: Option<&str>,
    mut settings: Settings,
) -> Result<()> {
    if let Some(provider) = provider {
        settings.generation.provider = provider.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    }

    preflight::check(Operation::Generate, &settings)?;

    let orchestrator = Orchestrator::new(settings)?;
    let video = orchestrator.resolve_video(input)?;

    let transcript = match orchestrator.load_transcript(&video.video_id, false).await {
        Ok(transcript) => transcript,
        Err(e) => {
            Output::warning(&format!("No transcript available for {}: {}", video.video_id, e));
            return Ok(());
        }
    };

    let spinner = Output::spinner("Extracting cases...");
    let outcome = orchestrator.extract(&transcript).await;
    spinner.finish_and_clear();

    match outcome.source {
        ExtractionSource::Unavailable => {
            Output::warning("The model could not be reached. No cases extracted.");
            return Ok(());
        }
        ExtractionSource::Fallback => {
            Output::warning("The model reply was malformed; cases were recovered field by field.");
        }
        ExtractionSource::Parsed => {}
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.cases)?);
        return Ok(());
    }

    if outcome.cases.is_empty() {
        Output::warning("No cases found in the transcript.");
        return Ok(());
    }

    for (i, case) in outcome.cases.iter().enumerate() {
        Output::header(&format!("Case {}", i + 1));
        Output::kv("Situation", &case.situation);
        Output::kv("Conversation", &case.conversation);
        Output::kv("Question", &case.question);
    }

    Ok(())
}
