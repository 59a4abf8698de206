//! Status command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the status command.
pub async fn run_status(settings: Settings) -> Result<()> {
    let data_dir = settings.data_dir();
    let orchestrator = Orchestrator::new(settings)?;

    let raw = orchestrator.library().list_raw()?;
    let structured = orchestrator.library().list_structured()?;
    let units = orchestrator.unit_count().await?;

    Output::header("Charla status");
    Output::kv("Data directory", &data_dir.to_string_lossy());
    Output::kv("Raw transcripts", &raw.len().to_string());
    Output::kv("Structured records", &structured.len().to_string());
    Output::kv("Indexed units", &units.to_string());

    if !structured.is_empty() && units == 0 {
        Output::info("Structured records are not indexed yet. Run 'charla ingest'.");
    }
    if raw.len() > structured.len() {
        Output::info("Some raw transcripts are not structured yet. Run 'charla structure --all'.");
    }

    Ok(())
}
