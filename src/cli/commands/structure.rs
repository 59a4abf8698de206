//! Structure command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the structure command.
pub async fn run_structure(
    video_id: Option<&str>,
    all: bool,
    settings: Settings,
) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    match (video_id, all) {
        (Some(id), _) => {
            let spinner = Output::spinner(&format!("Structuring {}...", id));
            let result = orchestrator.structure(id).await;
            spinner.finish_and_clear();

            match result {
                Ok(record) => {
                    Output::success(&format!(
                        "Structured {} ({} Q&A pairs)",
                        record.video_id,
                        record.qa_pairs.len()
                    ));
                }
                Err(e) => {
                    Output::error(&format!("Failed to structure {}: {}", id, e));
                    return Err(e.into());
                }
            }
        }
        (None, true) => {
            let raw_ids = orchestrator.library().list_raw()?;
            if raw_ids.is_empty() {
                Output::warning("No raw transcripts found. Place .txt files in the transcripts directory.");
                return Ok(());
            }

            Output::info(&format!("Found {} raw transcripts", raw_ids.len()));
            let spinner = Output::spinner("Structuring...");
            let records = orchestrator.structure_all().await?;
            spinner.finish_and_clear();

            Output::success(&format!(
                "Structured {} of {} transcripts",
                records.len(),
                raw_ids.len()
            ));
        }
        (None, false) => {
            Output::error("Provide a video id or use --all.");
        }
    }

    Ok(())
}
