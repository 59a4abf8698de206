//! Pipeline coordination for Charla.
//!
//! Wires configuration into concrete components and exposes the operations
//! the CLI (or any other caller) works with: structuring lessons, ingesting
//! them into the vector store, searching, and generating exercises.

use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::Result;
use crate::exercise::{ExerciseGenerator, ExerciseRequest, ExerciseResult};
use crate::generation::{OpenAIGenerator, TextGenerator};
use crate::ingest::{IngestReport, IngestionPipeline};
use crate::structurer::TranscriptStructurer;
use crate::transcript::{TranscriptLibrary, TranscriptRecord};
use crate::vector_store::{MemoryVectorStore, SqliteVectorStore, UnitMatch, VectorStore};
use std::sync::Arc;
use tracing::{info, instrument};

/// The main coordinator for the Charla pipeline.
pub struct Orchestrator {
    library: TranscriptLibrary,
    structurer: TranscriptStructurer,
    pipeline: IngestionPipeline,
    exercise_generator: ExerciseGenerator,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl Orchestrator {
    /// Create an orchestrator with components built from settings.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        ));

        let dimensions = settings.embedding.dimensions as usize;
        let store: Arc<dyn VectorStore> = match settings.vector_store.provider.as_str() {
            "memory" => Arc::new(MemoryVectorStore::new(dimensions)),
            _ => Arc::new(SqliteVectorStore::new(&settings.sqlite_path(), dimensions)?),
        };

        let structuring_model: Arc<dyn TextGenerator> =
            Arc::new(OpenAIGenerator::new(&settings.structuring.model));
        let generation_model: Arc<dyn TextGenerator> =
            Arc::new(OpenAIGenerator::new(&settings.generation.model));

        Self::with_components(
            settings,
            prompts,
            embedder,
            store,
            structuring_model,
            generation_model,
        )
    }

    /// Create an orchestrator with explicit components.
    ///
    /// This is the seam tests use to substitute service doubles.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        structuring_model: Arc<dyn TextGenerator>,
        generation_model: Arc<dyn TextGenerator>,
    ) -> Result<Self> {
        let library =
            TranscriptLibrary::new(&settings.transcripts_dir(), &settings.structured_dir())?;

        let structurer = TranscriptStructurer::new(
            structuring_model,
            prompts.clone(),
            settings.structuring.temperature,
        );

        let pipeline = IngestionPipeline::new(embedder.clone(), store.clone());

        let exercise_generator = ExerciseGenerator::new(
            embedder.clone(),
            store.clone(),
            generation_model,
            prompts,
            &settings.generation,
        );

        Ok(Self {
            library,
            structurer,
            pipeline,
            exercise_generator,
            embedder,
            store,
        })
    }

    /// The transcript library backing this orchestrator.
    pub fn library(&self) -> &TranscriptLibrary {
        &self.library
    }

    /// Structure one raw transcript and persist the record.
    pub async fn structure(&self, video_id: &str) -> Result<TranscriptRecord> {
        self.structurer.process(&self.library, video_id).await
    }

    /// Structure every raw transcript, containing per-lesson failures.
    pub async fn structure_all(&self) -> Result<Vec<TranscriptRecord>> {
        self.structurer.process_all(&self.library).await
    }

    /// Ingest all structured records into the vector store.
    pub async fn ingest(&self) -> Result<IngestReport> {
        self.pipeline.ingest_library(&self.library).await
    }

    /// Ingest only when the store is empty.
    ///
    /// Lets request-time callers lazily populate a fresh store without
    /// re-embedding an already-loaded one.
    #[instrument(skip(self))]
    pub async fn ensure_ingested(&self) -> Result<()> {
        let count = self.store.count().await?;
        if count == 0 {
            info!("Vector store is empty, ingesting structured transcripts");
            self.ingest().await?;
        } else {
            info!("Vector store contains {} units", count);
        }
        Ok(())
    }

    /// Generate a practice exercise grounded in the indexed lessons.
    pub async fn generate_exercise(&self, request: &ExerciseRequest) -> Result<ExerciseResult> {
        self.exercise_generator.generate(request).await
    }

    /// Similarity search over all indexed units.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<UnitMatch>> {
        let embedding = self.embedder.embed(query).await?;
        self.store.query(&embedding, limit, None).await
    }

    /// Number of units in the vector store.
    pub async fn unit_count(&self) -> Result<usize> {
        self.store.count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CharlaError;
    use crate::transcript::QaPair;
    use async_trait::async_trait;

    const DIMS: usize = 3;

    struct StubEmbedder;

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let sum: u32 = text.bytes().map(u32::from).sum();
            Ok(vec![(sum % 17) as f32, (sum % 5) as f32, 1.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::new();
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }

        fn dimensions(&self) -> usize {
            DIMS
        }
    }

    struct CannedGenerator {
        response: String,
    }

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn complete(&self, _system: &str, _user: &str, _temperature: f32) -> Result<String> {
            Ok(self.response.clone())
        }
    }

    fn test_settings(data_dir: &std::path::Path) -> Settings {
        let mut settings = Settings::default();
        settings.general.data_dir = data_dir.to_string_lossy().to_string();
        settings.embedding.dimensions = DIMS as u32;
        settings.vector_store.provider = "memory".to_string();
        settings
    }

    fn orchestrator_with(
        data_dir: &std::path::Path,
        structuring_response: &str,
        generation_response: &str,
    ) -> Orchestrator {
        let settings = test_settings(data_dir);
        Orchestrator::with_components(
            settings,
            Prompts::default(),
            Arc::new(StubEmbedder),
            Arc::new(MemoryVectorStore::new(DIMS)),
            Arc::new(CannedGenerator {
                response: structuring_response.to_string(),
            }),
            Arc::new(CannedGenerator {
                response: generation_response.to_string(),
            }),
        )
        .unwrap()
    }

    const STRUCTURING_RESPONSE: &str = r#"{
        "introduction": "Bienvenidos a la lección.",
        "conversation": "- Hola, me llamo Ana.\n- Mucho gusto, soy Luis.\n- ¿Cuántos años tienes?\n- Tengo veinte años.",
        "qa_pairs": [{"question": "¿Cómo se llama la chica?", "answer": "Se llama Ana."}]
    }"#;

    const GENERATION_RESPONSE: &str = r#"{
        "conversation": "- Hola, me llamo Pedro.\n- Encantada, soy Carmen.\n- ¿Dónde trabajas?\n- Trabajo en un hospital.",
        "question": "¿Dónde trabaja Carmen?",
        "question_translation": "Where does Carmen work?",
        "answers": [
            {"text": "En un hospital", "translation": "In a hospital", "is_correct": true},
            {"text": "En una escuela", "translation": "In a school", "is_correct": false},
            {"text": "En un banco", "translation": "In a bank", "is_correct": false},
            {"text": "En una tienda", "translation": "In a shop", "is_correct": false}
        ]
    }"#;

    #[tokio::test]
    async fn test_structure_ingest_generate_flow() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator =
            orchestrator_with(dir.path(), STRUCTURING_RESPONSE, GENERATION_RESPONSE);

        std::fs::write(
            dir.path().join("transcripts").join("lesson01.txt"),
            "raw transcript text",
        )
        .unwrap();

        let record = orchestrator.structure("lesson01").await.unwrap();
        assert_eq!(record.qa_pairs.len(), 1);

        let report = orchestrator.ingest().await.unwrap();
        assert!(report.succeeded());
        // introduction + conversation + question + answer
        assert_eq!(orchestrator.unit_count().await.unwrap(), 4);

        let exercise = orchestrator
            .generate_exercise(&ExerciseRequest::new("jobs", "comprehension"))
            .await
            .unwrap();
        assert!(exercise.context.contains("Carmen"));
        exercise.question.validate().unwrap();
    }

    #[tokio::test]
    async fn test_ensure_ingested_populates_empty_store_once() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator =
            orchestrator_with(dir.path(), STRUCTURING_RESPONSE, GENERATION_RESPONSE);

        let record: TranscriptRecord = TranscriptRecord {
            video_id: "lesson01".to_string(),
            introduction: None,
            conversation: Some("- Hola.\n- Buenos días.\n- ¿Qué tal?".to_string()),
            qa_pairs: vec![QaPair {
                question: "¿Qué dicen?".to_string(),
                answer: "Se saludan.".to_string(),
            }],
        };
        orchestrator.library().save_structured(&record).unwrap();

        orchestrator.ensure_ingested().await.unwrap();
        let count = orchestrator.unit_count().await.unwrap();
        assert_eq!(count, 3);

        // Second call must not re-ingest (count unchanged, no duplicates).
        orchestrator.ensure_ingested().await.unwrap();
        assert_eq!(orchestrator.unit_count().await.unwrap(), count);
    }

    #[tokio::test]
    async fn test_generate_on_empty_store_is_no_context() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator =
            orchestrator_with(dir.path(), STRUCTURING_RESPONSE, GENERATION_RESPONSE);

        let err = orchestrator
            .generate_exercise(&ExerciseRequest::new("jobs", "comprehension"))
            .await
            .unwrap_err();
        assert!(matches!(err, CharlaError::NoContext(_)));
    }

    #[tokio::test]
    async fn test_search_returns_nearest_first() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator =
            orchestrator_with(dir.path(), STRUCTURING_RESPONSE, GENERATION_RESPONSE);

        std::fs::write(
            dir.path().join("transcripts").join("lesson01.txt"),
            "raw transcript text",
        )
        .unwrap();
        orchestrator.structure("lesson01").await.unwrap();
        orchestrator.ingest().await.unwrap();

        let matches = orchestrator.search("anything", 2).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert!(matches[0].distance <= matches[1].distance);
    }
}
