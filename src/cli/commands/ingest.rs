//! Ingest command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the ingest command.
pub async fn run_ingest(settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    let structured = orchestrator.library().list_structured()?;
    if structured.is_empty() {
        Output::warning("No structured records found. Run 'charla structure --all' first.");
        return Ok(());
    }

    let spinner = Output::spinner(&format!(
        "Embedding and indexing {} records...",
        structured.len()
    ));
    let report = orchestrator.ingest().await?;
    spinner.finish_and_clear();

    if report.succeeded() {
        Output::success(&format!(
            "Stored {} units from {} records",
            report.units_stored, report.records_processed
        ));
        if report.units_skipped > 0 {
            Output::warning(&format!(
                "{} units skipped (embedding failures); re-run ingest to retry them",
                report.units_skipped
            ));
        }
    } else {
        Output::error("No units were stored. Check the embedding service and try again.");
    }

    Ok(())
}
