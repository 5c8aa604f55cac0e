//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::index::SectionFilter;
use crate::orchestrator::Orchestrator;
use crate::session::StudySession;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(
    query: &str,
    section: &str,
    limit: Option<usize>,
    settings: Settings,
) -> Result<()> {
    let filter: SectionFilter = section.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    preflight::check(Operation::Embed, &settings)?;

    let top_k = limit.unwrap_or(settings.index.top_k);
    let orchestrator = Orchestrator::new(settings)?;

    let mut session = StudySession::new();
    let spinner = Output::spinner("Searching...");
    let results = orchestrator
        .search_in_session(&mut session, query, filter, top_k)
        .await;
    spinner.finish_and_clear();

    match results {
        Ok(hits) if hits.is_empty() => {
            Output::warning("No results found. Use 'kikitori index <video>' to add content.");
        }
        Ok(hits) => {
            Output::success(&format!("Found {} results", hits.len()));
            for hit in hits {
                Output::search_result(hit);
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
