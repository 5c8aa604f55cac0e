//! Clear command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use std::io::{self, BufRead, Write};

/// Run the clear command.
pub async fn run_clear(yes: bool, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;
    let count = orchestrator.index().len().await?;

    if count == 0 {
        Output::info("The index is already empty.");
        return Ok(());
    }

    if !yes {
        print!("Remove {} indexed sections? [y/N] ", count);
        io::stdout().flush()?;

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        if !answer.trim().eq_ignore_ascii_case("y") {
            Output::info("Cancelled.");
            return Ok(());
        }
    }

    let removed = orchestrator.index().clear().await?;
    Output::success(&format!("Removed {} sections", removed));
    Ok(())
}
