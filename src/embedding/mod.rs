//! Embedding generation for semantic search and retrieval.

mod openai;

pub use openai::OpenAIEmbedder;

use crate::error::Result;
use async_trait::async_trait;
use tracing::warn;

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;

    /// Generate an embedding, returning an empty vector on any transport or
    /// service error instead of propagating it.
    ///
    /// Batch callers (ingestion) use this so one failed unit never aborts the
    /// rest of the batch; an empty vector marks the unit as unusable and it
    /// gets filtered before storage.
    async fn embed_lenient(&self, text: &str) -> Vec<f32> {
        match self.embed(text).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!("Embedding failed, marking unit unusable: {}", e);
                Vec::new()
            }
        }
    }
}
