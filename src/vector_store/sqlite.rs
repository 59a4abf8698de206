//! SQLite-based vector store implementation.
//!
//! Uses SQLite with cosine distance computed in Rust for simplicity. For
//! large collections consider the sqlite-vec extension or a dedicated vector
//! database; lesson libraries are small enough that a full scan is fine.

use super::{cosine_distance, IndexedUnit, UnitKind, UnitMatch, UnitMetadata, VectorStore};
use crate::error::{CharlaError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS units (
    id TEXT PRIMARY KEY,
    video_id TEXT NOT NULL,
    kind TEXT NOT NULL,
    question_number INTEGER,
    source TEXT NOT NULL,
    text TEXT NOT NULL,
    embedding BLOB NOT NULL,
    indexed_at TEXT NOT NULL,
    seq INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_units_video_id ON units(video_id);
CREATE INDEX IF NOT EXISTS idx_units_kind ON units(kind);
"#;

/// SQLite-based vector store.
///
/// Opening the same path reuses existing content; a fresh path starts empty.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
    dimensions: usize,
}

impl SqliteVectorStore {
    /// Open (or create) a store at the given path.
    #[instrument(skip_all)]
    pub fn new(path: &Path, dimensions: usize) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL allows concurrent readers while ingestion writes.
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Opened SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
            dimensions,
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory(dimensions: usize) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
            dimensions,
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| CharlaError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to little-endian bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn row_to_unit(row: &rusqlite::Row<'_>) -> rusqlite::Result<IndexedUnit> {
        let kind_str: String = row.get(2)?;
        let embedding_bytes: Vec<u8> = row.get(6)?;
        let indexed_at_str: String = row.get(7)?;

        Ok(IndexedUnit {
            id: row.get(0)?,
            metadata: UnitMetadata {
                video_id: row.get(1)?,
                kind: kind_str.parse().unwrap_or(UnitKind::Conversation),
                question_number: row.get(3)?,
                source: row.get(4)?,
            },
            text: row.get(5)?,
            embedding: Self::bytes_to_embedding(&embedding_bytes),
            indexed_at: DateTime::parse_from_rfc3339(&indexed_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, units), fields(count = units.len()))]
    async fn upsert(&self, units: &[IndexedUnit]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        let mut stored = 0;

        for unit in units {
            if !unit.is_usable(self.dimensions) {
                debug!("Skipping unit {} with unusable embedding", unit.id);
                continue;
            }

            // seq is assigned once per id and preserved on overwrite, so
            // insertion-order tie-breaking survives re-ingestion.
            let next_seq: i64 =
                tx.query_row("SELECT COALESCE(MAX(seq), 0) + 1 FROM units", [], |row| {
                    row.get(0)
                })?;

            tx.execute(
                r#"
                INSERT INTO units (id, video_id, kind, question_number, source, text, embedding, indexed_at, seq)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ON CONFLICT(id) DO UPDATE SET
                    video_id = excluded.video_id,
                    kind = excluded.kind,
                    question_number = excluded.question_number,
                    source = excluded.source,
                    text = excluded.text,
                    embedding = excluded.embedding,
                    indexed_at = excluded.indexed_at
                "#,
                params![
                    unit.id,
                    unit.metadata.video_id,
                    unit.metadata.kind.to_string(),
                    unit.metadata.question_number,
                    unit.metadata.source,
                    unit.text,
                    Self::embedding_to_bytes(&unit.embedding),
                    unit.indexed_at.to_rfc3339(),
                    next_seq,
                ],
            )?;
            stored += 1;
        }

        tx.commit()?;
        info!("Upserted {} of {} units", stored, units.len());
        Ok(stored)
    }

    #[instrument(skip(self, query_embedding))]
    async fn query(
        &self,
        query_embedding: &[f32],
        k: usize,
        filter: Option<UnitKind>,
    ) -> Result<Vec<UnitMatch>> {
        let conn = self.lock()?;

        let sql = match filter {
            Some(_) => {
                "SELECT id, video_id, kind, question_number, source, text, embedding, indexed_at
                 FROM units WHERE kind = ?1 ORDER BY seq"
            }
            None => {
                "SELECT id, video_id, kind, question_number, source, text, embedding, indexed_at
                 FROM units ORDER BY seq"
            }
        };

        let mut stmt = conn.prepare(sql)?;
        let units: Vec<IndexedUnit> = match filter {
            Some(kind) => stmt
                .query_map(params![kind.to_string()], Self::row_to_unit)?
                .collect::<rusqlite::Result<_>>()?,
            None => stmt
                .query_map([], Self::row_to_unit)?
                .collect::<rusqlite::Result<_>>()?,
        };

        let mut matches: Vec<UnitMatch> = units
            .into_iter()
            .map(|u| UnitMatch {
                distance: cosine_distance(query_embedding, &u.embedding),
                id: u.id,
                text: u.text,
                metadata: u.metadata,
            })
            .collect();

        // Rows arrive in seq order; the stable sort keeps that order for ties.
        matches.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(k);

        debug!("Query returned {} matches", matches.len());
        Ok(matches)
    }

    #[instrument(skip(self))]
    async fn fetch(&self, limit: usize, filter: Option<UnitKind>) -> Result<Vec<IndexedUnit>> {
        let conn = self.lock()?;

        let sql = match filter {
            Some(_) => {
                "SELECT id, video_id, kind, question_number, source, text, embedding, indexed_at
                 FROM units WHERE kind = ?1 ORDER BY seq LIMIT ?2"
            }
            None => {
                "SELECT id, video_id, kind, question_number, source, text, embedding, indexed_at
                 FROM units ORDER BY seq LIMIT ?1"
            }
        };

        let mut stmt = conn.prepare(sql)?;
        let units: Vec<IndexedUnit> = match filter {
            Some(kind) => stmt
                .query_map(params![kind.to_string(), limit as i64], Self::row_to_unit)?
                .collect::<rusqlite::Result<_>>()?,
            None => stmt
                .query_map(params![limit as i64], Self::row_to_unit)?
                .collect::<rusqlite::Result<_>>()?,
        };

        Ok(units)
    }

    async fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM units", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(video_id: &str, kind: UnitKind, n: Option<u32>, embedding: Vec<f32>) -> IndexedUnit {
        IndexedUnit::new(video_id, kind, n, format!("{} text", kind), "test")
            .with_embedding(embedding)
    }

    #[tokio::test]
    async fn test_upsert_query_count() {
        let store = SqliteVectorStore::in_memory(3).unwrap();

        let stored = store
            .upsert(&[
                unit("v1", UnitKind::Conversation, None, vec![1.0, 0.0, 0.0]),
                unit("v1", UnitKind::Question, Some(1), vec![0.0, 1.0, 0.0]),
                unit("v1", UnitKind::Answer, Some(1), vec![]),
            ])
            .await
            .unwrap();

        assert_eq!(stored, 2);
        assert_eq!(store.count().await.unwrap(), 2);

        let matches = store.query(&[1.0, 0.0, 0.0], 10, None).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "v1_conversation");
        assert!(matches[0].distance < matches[1].distance);
    }

    #[tokio::test]
    async fn test_reingest_is_idempotent() {
        let store = SqliteVectorStore::in_memory(3).unwrap();

        let units = vec![
            unit("v1", UnitKind::Conversation, None, vec![1.0, 0.0, 0.0]),
            unit("v1", UnitKind::Question, Some(1), vec![0.0, 1.0, 0.0]),
        ];

        store.upsert(&units).await.unwrap();
        store.upsert(&units).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 2);

        let fetched = store.fetch(10, None).await.unwrap();
        let ids: Vec<&str> = fetched.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["v1_conversation", "v1_question_1"]);
    }

    #[tokio::test]
    async fn test_kind_filter() {
        let store = SqliteVectorStore::in_memory(3).unwrap();

        store
            .upsert(&[
                unit("v1", UnitKind::Conversation, None, vec![1.0, 0.0, 0.0]),
                unit("v1", UnitKind::Introduction, None, vec![1.0, 0.0, 0.0]),
            ])
            .await
            .unwrap();

        let matches = store
            .query(&[1.0, 0.0, 0.0], 10, Some(UnitKind::Conversation))
            .await
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].metadata.kind, UnitKind::Conversation);

        let fetched = store
            .fetch(10, Some(UnitKind::Introduction))
            .await
            .unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].metadata.kind, UnitKind::Introduction);
    }

    #[tokio::test]
    async fn test_persistence_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectors.db");

        {
            let store = SqliteVectorStore::new(&path, 3).unwrap();
            store
                .upsert(&[unit("v1", UnitKind::Conversation, None, vec![1.0, 0.0, 0.0])])
                .await
                .unwrap();
        }

        let reopened = SqliteVectorStore::new(&path, 3).unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);
    }
}
