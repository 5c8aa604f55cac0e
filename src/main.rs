//! Kikitori CLI entry point.

use anyhow::Result;
use clap::Parser;
use kikitori::cli::{commands, Cli, Commands};
use kikitori::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Initialize logging; -v overrides the configured level
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("kikitori={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    std::fs::create_dir_all(settings.data_dir())?;

    match &cli.command {
        Commands::Fetch { video, force, show } => {
            commands::run_fetch(video, *force, *show, settings).await?;
        }

        Commands::Sections { video, policy } => {
            commands::run_sections(video, policy.as_deref(), settings).await?;
        }

        Commands::Index { video, force } => {
            commands::run_index(video, *force, settings).await?;
        }

        Commands::Search {
            query,
            section,
            limit,
        } => {
            commands::run_search(query, section, *limit, settings).await?;
        }

        Commands::Extract {
            video,
            json,
            provider,
        } => {
            commands::run_extract(video, *json, provider.as_deref(), settings).await?;
        }

        Commands::Quiz {
            video,
            rebuild,
            strategy,
        } => {
            commands::run_quiz(video, *rebuild, strategy.as_deref(), settings).await?;
        }

        Commands::List => {
            commands::run_list(settings).await?;
        }

        Commands::Clear { yes } => {
            commands::run_clear(*yes, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings)?;
        }
    }

    Ok(())
}
