//! Retrieval-augmented exercise generation.
//!
//! Each request walks a fixed pipeline: QUERY (embed the learning objective,
//! retrieve nearest conversation fragments), FILTER (drop fragments too short
//! to be a full exchange, falling back to an unfiltered fetch on cold or
//! sparse stores), GENERATE (prompt the model for a new conversation plus one
//! multiple-choice question), PARSE (layered JSON recovery and field
//! validation). There is no ungrounded generation path: an empty store fails
//! the request with `NoContext`.

use super::{AnswerOption, ExerciseQuestion, ExerciseRequest, ExerciseResult};
use crate::config::{GenerationSettings, Prompts};
use crate::embedding::Embedder;
use crate::error::{CharlaError, Result};
use crate::generation::TextGenerator;
use crate::json_extract::JsonExtractor;
use crate::vector_store::{UnitKind, VectorStore};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// The schema the exercise prompt asks the model to produce.
#[derive(Debug, Deserialize)]
struct GenerationResponse {
    conversation: String,
    question: String,
    question_translation: String,
    answers: Vec<AnswerOption>,
}

/// Generates practice exercises grounded in retrieved lesson fragments.
pub struct ExerciseGenerator {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    generator: Arc<dyn TextGenerator>,
    extractor: JsonExtractor,
    prompts: Prompts,
    temperature: f32,
    /// How many fragments to retrieve; tunable, default 3.
    context_results: usize,
    /// Fragments with fewer lines than this are not full exchanges; tunable,
    /// default 3.
    min_context_lines: usize,
}

impl ExerciseGenerator {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        generator: Arc<dyn TextGenerator>,
        prompts: Prompts,
        settings: &GenerationSettings,
    ) -> Self {
        Self {
            embedder,
            store,
            generator,
            extractor: JsonExtractor::new(),
            prompts,
            temperature: settings.temperature,
            context_results: settings.context_results,
            min_context_lines: settings.min_context_lines,
        }
    }

    /// QUERY + FILTER: build the grounding context for a request.
    ///
    /// Retrieves the nearest conversation fragments, keeps those long enough
    /// to be a full exchange, and joins them under one labeled block. When
    /// the filtered set is empty, falls back to fetching any stored units
    /// regardless of kind. Fails with `NoContext` when even the fallback
    /// yields nothing.
    async fn retrieve_context(&self, query: &str) -> Result<String> {
        let query_embedding = self.embedder.embed(query).await?;

        let matches = self
            .store
            .query(
                &query_embedding,
                self.context_results,
                Some(UnitKind::Conversation),
            )
            .await?;

        let mut fragments: Vec<String> = matches
            .iter()
            .filter(|m| m.text.lines().count() >= self.min_context_lines)
            .map(|m| m.text.trim().to_string())
            .collect();

        if fragments.is_empty() {
            debug!("No usable conversation fragments, falling back to unfiltered fetch");
            fragments = self
                .store
                .fetch(self.context_results, None)
                .await?
                .into_iter()
                .map(|u| u.text.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
        }

        if fragments.is_empty() {
            return Err(CharlaError::NoContext(
                "the vector store has no usable fragments; run ingestion first".to_string(),
            ));
        }

        debug!("Grounding on {} fragments", fragments.len());
        Ok(format!("Conversation:\n{}", fragments.join("\n")))
    }

    /// Generate a complete exercise for a request.
    #[instrument(skip(self), fields(query = %request.query, question_type = %request.question_type))]
    pub async fn generate(&self, request: &ExerciseRequest) -> Result<ExerciseResult> {
        let context = self.retrieve_context(&request.query).await?;

        let mut vars = HashMap::new();
        vars.insert("context".to_string(), context);
        vars.insert("question_type".to_string(), request.question_type.clone());
        let user_prompt = self
            .prompts
            .render_with_custom(&self.prompts.exercise.user, &vars);

        let response = self
            .generator
            .complete(&self.prompts.exercise.system, &user_prompt, self.temperature)
            .await?;

        let parsed: GenerationResponse = self.extractor.extract_as(&response)?;

        let question = ExerciseQuestion {
            question_text: parsed.question,
            translated_question_text: parsed.question_translation,
            answers: parsed.answers,
        };
        question.validate()?;

        info!("Generated exercise for '{}'", request.query);

        Ok(ExerciseResult {
            context: parsed.conversation,
            question,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::{IndexedUnit, MemoryVectorStore};
    use async_trait::async_trait;

    const DIMS: usize = 3;

    struct StubEmbedder;

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let sum: u32 = text.bytes().map(u32::from).sum();
            Ok(vec![(sum % 11) as f32, (sum % 3) as f32, 1.0])
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

    const GOOD_RESPONSE: &str = r#"{
        "conversation": "- Hola, me llamo Pedro.\n- Mucho gusto, soy Carmen.\n- ¿De dónde eres?\n- Soy de Sevilla.",
        "question": "¿De dónde es Carmen?",
        "question_translation": "Where is Carmen from?",
        "answers": [
            {"text": "De Sevilla", "translation": "From Seville", "is_correct": true},
            {"text": "De Madrid", "translation": "From Madrid", "is_correct": false},
            {"text": "De Valencia", "translation": "From Valencia", "is_correct": false},
            {"text": "De Bilbao", "translation": "From Bilbao", "is_correct": false}
        ]
    }"#;

    fn conversation_unit(video_id: &str, text: &str) -> IndexedUnit {
        IndexedUnit::new(video_id, UnitKind::Conversation, None, text.to_string(), "test")
    }

    async fn store_with(units: Vec<IndexedUnit>) -> Arc<MemoryVectorStore> {
        let store = Arc::new(MemoryVectorStore::new(DIMS));
        let embedder = StubEmbedder;
        let mut embedded = Vec::new();
        for unit in units {
            let embedding = embedder.embed(&unit.text).await.unwrap();
            embedded.push(unit.with_embedding(embedding));
        }
        store.upsert(&embedded).await.unwrap();
        store
    }

    fn generator_over(
        store: Arc<MemoryVectorStore>,
        response: &str,
    ) -> ExerciseGenerator {
        ExerciseGenerator::new(
            Arc::new(StubEmbedder),
            store,
            Arc::new(CannedGenerator {
                response: response.to_string(),
            }),
            Prompts::default(),
            &GenerationSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_generates_exercise_from_grounded_context() {
        let store = store_with(vec![conversation_unit(
            "lesson01",
            "- Hola, ¿cómo te llamas?\n- Me llamo Ana.\n- ¿Cuántos años tienes?\n- Tengo veinte años.",
        )])
        .await;

        let result = generator_over(store, GOOD_RESPONSE)
            .generate(&ExerciseRequest::new("introductions", "comprehension"))
            .await
            .unwrap();

        assert!(result.context.contains("Pedro"));
        assert_eq!(result.question.answers.len(), 4);
        assert_eq!(
            result.question.answers.iter().filter(|a| a.is_correct).count(),
            1
        );
    }

    #[tokio::test]
    async fn test_short_fragment_falls_back_to_unfiltered_fetch() {
        // Only candidate is one line long; the filter must discard it and the
        // fallback fetch must still ground the request.
        let store = store_with(vec![conversation_unit("lesson01", "Hola.")]).await;

        let result = generator_over(store, GOOD_RESPONSE)
            .generate(&ExerciseRequest::new("greetings", "comprehension"))
            .await
            .unwrap();

        assert_eq!(result.question.correct_answer().unwrap().text, "De Sevilla");
    }

    #[tokio::test]
    async fn test_empty_store_fails_with_no_context() {
        let store = Arc::new(MemoryVectorStore::new(DIMS));

        let err = generator_over(store, GOOD_RESPONSE)
            .generate(&ExerciseRequest::new("greetings", "comprehension"))
            .await
            .unwrap_err();

        assert!(matches!(err, CharlaError::NoContext(_)));
    }

    #[tokio::test]
    async fn test_missing_answers_field_is_validation_failure() {
        let store = store_with(vec![conversation_unit(
            "lesson01",
            "- Hola.\n- Buenos días.\n- ¿Qué tal?",
        )])
        .await;

        let response = r#"{
            "conversation": "- Hola.",
            "question": "¿Qué dicen?",
            "question_translation": "What do they say?"
        }"#;

        let err = generator_over(store, response)
            .generate(&ExerciseRequest::new("greetings", "comprehension"))
            .await
            .unwrap_err();

        assert!(matches!(err, CharlaError::Validation(_)));
    }

    #[tokio::test]
    async fn test_two_correct_answers_rejected() {
        let store = store_with(vec![conversation_unit(
            "lesson01",
            "- Hola.\n- Buenos días.\n- ¿Qué tal?",
        )])
        .await;

        let response = GOOD_RESPONSE.replace(
            r#"{"text": "De Madrid", "translation": "From Madrid", "is_correct": false}"#,
            r#"{"text": "De Madrid", "translation": "From Madrid", "is_correct": true}"#,
        );

        let err = generator_over(store, &response)
            .generate(&ExerciseRequest::new("origins", "comprehension"))
            .await
            .unwrap_err();

        assert!(matches!(err, CharlaError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unparseable_response_is_malformed() {
        let store = store_with(vec![conversation_unit(
            "lesson01",
            "- Hola.\n- Buenos días.\n- ¿Qué tal?",
        )])
        .await;

        let err = generator_over(store, "no json here")
            .generate(&ExerciseRequest::new("greetings", "comprehension"))
            .await
            .unwrap_err();

        assert!(matches!(err, CharlaError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_fenced_response_is_recovered() {
        let store = store_with(vec![conversation_unit(
            "lesson01",
            "- Hola.\n- Buenos días.\n- ¿Qué tal?",
        )])
        .await;

        let response = format!("Here you go:\n```json\n{}\n```", GOOD_RESPONSE);
        let result = generator_over(store, &response)
            .generate(&ExerciseRequest::new("greetings", "comprehension"))
            .await
            .unwrap();

        assert_eq!(result.question.question_text, "¿De dónde es Carmen?");
    }
}
