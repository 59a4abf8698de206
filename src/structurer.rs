//! Transcript structuring.
//!
//! Converts a raw lesson transcript into a [`TranscriptRecord`] by asking a
//! generative model for a fixed JSON schema and recovering that JSON
//! defensively. One model call per transcript, no automatic retry; retry
//! policy belongs to the caller.

use crate::config::Prompts;
use crate::error::{CharlaError, Result};
use crate::generation::TextGenerator;
use crate::json_extract::JsonExtractor;
use crate::transcript::{QaPair, TranscriptLibrary, TranscriptRecord};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// The schema the structuring prompt asks the model to produce.
#[derive(Debug, Deserialize)]
struct StructuredResponse {
    #[serde(default)]
    introduction: Option<String>,
    #[serde(default)]
    conversation: Option<String>,
    #[serde(default)]
    qa_pairs: Vec<QaPair>,
}

/// Structures raw transcripts via a generative-model call.
pub struct TranscriptStructurer {
    generator: Arc<dyn TextGenerator>,
    extractor: JsonExtractor,
    prompts: Prompts,
    temperature: f32,
}

impl TranscriptStructurer {
    /// Create a structurer over the given text generator.
    pub fn new(generator: Arc<dyn TextGenerator>, prompts: Prompts, temperature: f32) -> Self {
        Self {
            generator,
            extractor: JsonExtractor::new(),
            prompts,
            temperature,
        }
    }

    /// Structure a raw transcript into a record.
    ///
    /// Fails with `MalformedResponse` when no JSON can be recovered from the
    /// model output, and with `Validation` when the recovered object has no
    /// introduction, no conversation, and no Q&A pairs. Never returns a
    /// partially-valid record.
    #[instrument(skip(self, raw_text), fields(video_id = %video_id))]
    pub async fn structure(&self, video_id: &str, raw_text: &str) -> Result<TranscriptRecord> {
        if raw_text.trim().is_empty() {
            return Err(CharlaError::InvalidInput(format!(
                "Transcript {} is empty",
                video_id
            )));
        }

        let mut vars = HashMap::new();
        vars.insert("transcript".to_string(), raw_text.to_string());
        let user_prompt = self
            .prompts
            .render_with_custom(&self.prompts.structuring.user, &vars);

        let response = self
            .generator
            .complete(&self.prompts.structuring.system, &user_prompt, self.temperature)
            .await?;

        let structured: StructuredResponse = self.extractor.extract_as(&response)?;

        let record = TranscriptRecord {
            video_id: video_id.to_string(),
            introduction: structured.introduction,
            conversation: structured.conversation,
            qa_pairs: structured.qa_pairs,
        };

        if record.is_empty() {
            return Err(CharlaError::Validation(format!(
                "Structured transcript {} has no introduction, conversation, or Q&A pairs",
                video_id
            )));
        }

        info!(
            "Structured transcript {} ({} Q&A pairs)",
            video_id,
            record.qa_pairs.len()
        );
        Ok(record)
    }

    /// Process one lesson: load raw text, structure it, save the record.
    ///
    /// A new record supersedes any previous one for the same lesson.
    pub async fn process(
        &self,
        library: &TranscriptLibrary,
        video_id: &str,
    ) -> Result<TranscriptRecord> {
        let raw_text = library.load_raw(video_id)?;
        let record = self.structure(video_id, &raw_text).await?;
        library.save_structured(&record)?;
        Ok(record)
    }

    /// Process every raw transcript in the library.
    ///
    /// Failures are contained per lesson; one bad transcript does not stop
    /// the rest. Returns the successfully structured records.
    pub async fn process_all(&self, library: &TranscriptLibrary) -> Result<Vec<TranscriptRecord>> {
        let mut records = Vec::new();

        for video_id in library.list_raw()? {
            match self.process(library, &video_id).await {
                Ok(record) => records.push(record),
                Err(e) => warn!("Failed to structure {}: {}", video_id, e),
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CharlaError;
    use async_trait::async_trait;

    /// Test double that returns a fixed response.
    struct CannedGenerator {
        response: String,
    }

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn complete(&self, _system: &str, _user: &str, _temperature: f32) -> Result<String> {
            Ok(self.response.clone())
        }
    }

    fn structurer(response: &str) -> TranscriptStructurer {
        TranscriptStructurer::new(
            Arc::new(CannedGenerator {
                response: response.to_string(),
            }),
            Prompts::default(),
            0.2,
        )
    }

    #[tokio::test]
    async fn test_recovers_fenced_json() {
        let response = "Here is the JSON: ```json\n{\"introduction\":\"Hola\",\"conversation\":\"...\",\"qa_pairs\":[]}\n```";
        let record = structurer(response)
            .structure("lesson01", "raw transcript text")
            .await
            .unwrap();

        assert_eq!(record.introduction.as_deref(), Some("Hola"));
        assert_eq!(record.video_id, "lesson01");
        assert!(record.qa_pairs.is_empty());
    }

    #[tokio::test]
    async fn test_parses_prose_wrapped_json() {
        let response = r#"Sure! {"conversation": "- Hola.\n- Buenos días.", "qa_pairs": [{"question": "¿Qué dicen?", "answer": "Se saludan."}]} Done."#;
        let record = structurer(response)
            .structure("lesson02", "raw")
            .await
            .unwrap();

        assert!(record.introduction.is_none());
        assert_eq!(record.qa_pairs.len(), 1);
        assert_eq!(record.qa_pairs[0].question, "¿Qué dicen?");
    }

    #[tokio::test]
    async fn test_empty_record_is_validation_failure() {
        let response = r#"{"introduction": null, "conversation": "  ", "qa_pairs": []}"#;
        let err = structurer(response)
            .structure("lesson03", "raw")
            .await
            .unwrap_err();

        assert!(matches!(err, CharlaError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unparseable_response_is_malformed() {
        let err = structurer("I cannot help with that.")
            .structure("lesson04", "raw")
            .await
            .unwrap_err();

        assert!(matches!(err, CharlaError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_empty_input_rejected() {
        let err = structurer("{}").structure("lesson05", "  \n ").await.unwrap_err();
        assert!(matches!(err, CharlaError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_process_saves_record() {
        let dir = tempfile::tempdir().unwrap();
        let library =
            TranscriptLibrary::new(&dir.path().join("raw"), &dir.path().join("structured"))
                .unwrap();

        std::fs::write(
            dir.path().join("raw").join("lesson01.txt"),
            "Hola. Bienvenidos.",
        )
        .unwrap();

        let response = r#"{"introduction": "Hola. Bienvenidos.", "conversation": null, "qa_pairs": []}"#;
        let record = structurer(response)
            .process(&library, "lesson01")
            .await
            .unwrap();

        assert!(library.has_structured("lesson01"));
        assert_eq!(library.load_structured("lesson01").unwrap(), record);
    }
}
