//! Ingestion pipeline: structured records -> indexed units -> vector store.
//!
//! Each record decomposes into at most one introduction unit, at most one
//! conversation unit, and one question plus one answer unit per Q&A pair.
//! Units embed independently through the lenient path, so an embedding-service
//! outage on one unit never blocks the others; invalid units are filtered at
//! upsert. The whole batch counts as a success if at least one unit lands.
//!
//! Re-running on unchanged inputs produces the same deterministic ids and the
//! same store count, so ingestion is safe to repeat after partial failure. It
//! is not safe to run concurrently with itself against one store.

use crate::embedding::Embedder;
use crate::error::Result;
use crate::transcript::{TranscriptLibrary, TranscriptRecord};
use crate::vector_store::{IndexedUnit, UnitKind, VectorStore};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Outcome of one ingestion run.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Structured records read from the library.
    pub records_processed: usize,
    /// Units that embedded successfully.
    pub units_embedded: usize,
    /// Units dropped for empty or blank text, or a failed embedding.
    pub units_skipped: usize,
    /// Units actually written to the store.
    pub units_stored: usize,
}

impl IngestReport {
    /// Lenient success: at least one unit made it into the store.
    pub fn succeeded(&self) -> bool {
        self.units_stored > 0
    }
}

/// Orchestrates decomposition, embedding, and bulk upsert.
pub struct IngestionPipeline {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl IngestionPipeline {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Decompose a record into its embeddable fragments, without embeddings.
    ///
    /// Q&A ordinals are 1-indexed. Blank parts produce no unit.
    pub fn decompose(record: &TranscriptRecord) -> Vec<IndexedUnit> {
        let source = format!("structured/{}.json", record.video_id);
        let mut units = Vec::new();

        if let Some(introduction) = non_blank(&record.introduction) {
            units.push(IndexedUnit::new(
                &record.video_id,
                UnitKind::Introduction,
                None,
                introduction,
                &source,
            ));
        }

        if let Some(conversation) = non_blank(&record.conversation) {
            units.push(IndexedUnit::new(
                &record.video_id,
                UnitKind::Conversation,
                None,
                conversation,
                &source,
            ));
        }

        for (i, pair) in record.qa_pairs.iter().enumerate() {
            let ordinal = (i + 1) as u32;
            if !pair.question.trim().is_empty() {
                units.push(IndexedUnit::new(
                    &record.video_id,
                    UnitKind::Question,
                    Some(ordinal),
                    pair.question.clone(),
                    &source,
                ));
            }
            if !pair.answer.trim().is_empty() {
                units.push(IndexedUnit::new(
                    &record.video_id,
                    UnitKind::Answer,
                    Some(ordinal),
                    pair.answer.clone(),
                    &source,
                ));
            }
        }

        units
    }

    /// Ingest a set of records: embed every fragment, store the valid ones.
    #[instrument(skip(self, records), fields(records = records.len()))]
    pub async fn ingest_records(&self, records: &[TranscriptRecord]) -> Result<IngestReport> {
        let mut report = IngestReport {
            records_processed: records.len(),
            ..Default::default()
        };

        let mut batch = Vec::new();
        let dimensions = self.embedder.dimensions();

        for record in records {
            for unit in Self::decompose(record) {
                let embedding = self.embedder.embed_lenient(&unit.text).await;
                let unit = unit.with_embedding(embedding);

                if unit.is_usable(dimensions) {
                    report.units_embedded += 1;
                } else {
                    report.units_skipped += 1;
                }
                // The store filters unusable units itself; push everything so
                // the store's own invariant is what gets exercised.
                batch.push(unit);
            }
        }

        report.units_stored = self.store.upsert(&batch).await?;

        if report.succeeded() {
            info!(
                "Ingested {} units from {} records ({} skipped)",
                report.units_stored, report.records_processed, report.units_skipped
            );
        } else {
            warn!(
                "Ingestion stored nothing ({} records, {} units skipped)",
                report.records_processed, report.units_skipped
            );
        }

        Ok(report)
    }

    /// Ingest every structured record in the library.
    pub async fn ingest_library(&self, library: &TranscriptLibrary) -> Result<IngestReport> {
        let records = library.load_all_structured()?;
        self.ingest_records(&records).await
    }
}

fn non_blank(part: &Option<String>) -> Option<String> {
    part.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
