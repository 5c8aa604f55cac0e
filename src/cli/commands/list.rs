//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    match orchestrator.index().list_videos().await {
        Ok(videos) => {
            if videos.is_empty() {
                Output::info("No videos indexed yet. Use 'kikitori index <video>' to add content.");
            } else {
                Output::header(&format!("Indexed Videos ({})", videos.len()));
                println!();

                for video in &videos {
                    Output::video_info(
                        &video.video_id,
                        video.level.as_deref(),
                        video.segment_count,
                        &video.indexed_at.format("%Y-%m-%d %H:%M").to_string(),
                    );
                }

                let total: u32 = videos.iter().map(|v| v.segment_count).sum();
                println!();
                Output::kv("Total videos", &videos.len().to_string());
                Output::kv("Total sections", &total.to_string());
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list videos: {}", e));
            return Err(e.into());
        }
    }

    let library = &orchestrator.settings().library.videos;
    if !library.is_empty() {
        Output::header("Library");
        for (level, video_id) in library {
            Output::list_item(&format!("{}: {}", level, video_id));
        }
    }

    Ok(())
}
