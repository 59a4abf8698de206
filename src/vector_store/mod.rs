//! Vector store abstraction for Charla.
//!
//! Provides a trait-based interface for different vector store backends.
//! Every stored entry has a non-empty embedding and a unique, deterministic
//! id; re-ingesting a lesson overwrites its units in place.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of fragment an indexed unit was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Introduction,
    Conversation,
    Question,
    Answer,
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitKind::Introduction => write!(f, "introduction"),
            UnitKind::Conversation => write!(f, "conversation"),
            UnitKind::Question => write!(f, "question"),
            UnitKind::Answer => write!(f, "answer"),
        }
    }
}

impl std::str::FromStr for UnitKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "introduction" => Ok(UnitKind::Introduction),
            "conversation" => Ok(UnitKind::Conversation),
            "question" => Ok(UnitKind::Question),
            "answer" => Ok(UnitKind::Answer),
            _ => Err(format!("Unknown unit kind: {}", s)),
        }
    }
}

/// Metadata attached to every indexed unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitMetadata {
    /// Lesson this unit was derived from.
    pub video_id: String,
    /// Fragment kind.
    #[serde(rename = "type")]
    pub kind: UnitKind,
    /// 1-indexed ordinal for question/answer units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_number: Option<u32>,
    /// Where the fragment came from (structured record path or label).
    pub source: String,
}

/// One embeddable fragment derived from a transcript record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedUnit {
    /// Deterministic id: `<video_id>_<kind>` or `<video_id>_<kind>_<n>`.
    pub id: String,
    /// The fragment's content.
    pub text: String,
    /// Unit metadata.
    pub metadata: UnitMetadata,
    /// Embedding vector. Empty marks the unit invalid; stores filter it out.
    pub embedding: Vec<f32>,
    /// When this unit was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl IndexedUnit {
    /// Create a unit with no embedding yet.
    pub fn new(
        video_id: &str,
        kind: UnitKind,
        question_number: Option<u32>,
        text: String,
        source: &str,
    ) -> Self {
        Self {
            id: Self::unit_id(video_id, kind, question_number),
            text,
            metadata: UnitMetadata {
                video_id: video_id.to_string(),
                kind,
                question_number,
                source: source.to_string(),
            },
            embedding: Vec::new(),
            indexed_at: Utc::now(),
        }
    }

    /// Attach an embedding.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }

    /// Compute the deterministic unit id.
    ///
    /// Same lesson + kind + ordinal always yields the same id, which is what
    /// makes re-ingestion overwrite instead of duplicate.
    pub fn unit_id(video_id: &str, kind: UnitKind, question_number: Option<u32>) -> String {
        match question_number {
            Some(n) => format!("{}_{}_{}", video_id, kind, n),
            None => format!("{}_{}", video_id, kind),
        }
    }

    /// Whether the unit can be stored and queried.
    ///
    /// A vector of length other than the embedder's dimensionality (including
    /// empty, the fail-soft marker) is unusable.
    pub fn is_usable(&self, dimensions: usize) -> bool {
        self.embedding.len() == dimensions
    }
}

/// A query match, nearest first.
#[derive(Debug, Clone)]
pub struct UnitMatch {
    pub id: String,
    pub text: String,
    pub metadata: UnitMetadata,
    /// Cosine distance to the query vector; lower is closer.
    pub distance: f32,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store units, overwriting by id.
    ///
    /// Units with empty or otherwise invalid embeddings are filtered out, not
    /// rejected with an error; the return value is the number actually
    /// stored. Callers treat a count of at least one as success, which keeps
    /// partial ingestion failure from becoming total pipeline failure.
    async fn upsert(&self, units: &[IndexedUnit]) -> Result<usize>;

    /// Similarity query: the `k` nearest units, ascending by distance.
    ///
    /// Ties are broken by insertion order. Returns fewer than `k` results when
    /// the store has fewer eligible entries. `filter` constrains matches to a
    /// single unit kind.
    async fn query(
        &self,
        query_embedding: &[f32],
        k: usize,
        filter: Option<UnitKind>,
    ) -> Result<Vec<UnitMatch>>;

    /// Fetch up to `limit` units in insertion order, without similarity.
    ///
    /// Used as the generator's fallback when filtered retrieval comes back
    /// empty on a cold or sparse store.
    async fn fetch(&self, limit: usize, filter: Option<UnitKind>) -> Result<Vec<IndexedUnit>>;

    /// Total number of stored units.
    async fn count(&self) -> Result<usize>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Cosine distance: 0.0 for identical direction, 2.0 for opposite.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}
