//! Charla CLI entry point.

use anyhow::Result;
use charla::cli::{commands, Cli, Commands};
use charla::config::Settings;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("charla={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Ensure data directories exist
    std::fs::create_dir_all(settings.transcripts_dir())?;
    std::fs::create_dir_all(settings.structured_dir())?;

    // Execute command
    match &cli.command {
        Commands::Structure { video_id, all } => {
            commands::run_structure(video_id.as_deref(), *all, settings).await?;
        }

        Commands::Ingest => {
            commands::run_ingest(settings).await?;
        }

        Commands::Generate {
            query,
            question_type,
        } => {
            commands::run_generate(query, question_type, settings).await?;
        }

        Commands::Search { query, limit } => {
            commands::run_search(query, *limit, settings).await?;
        }

        Commands::Status => {
            commands::run_status(settings).await?;
        }
    }

    Ok(())
}
