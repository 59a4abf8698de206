//! In-memory vector store implementation.
//!
//! Useful for testing and small datasets. Keeps units in insertion order so
//! distance ties resolve the same way the persisted store resolves them.

use super::{cosine_distance, IndexedUnit, UnitKind, UnitMatch, VectorStore};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::RwLock;

/// In-memory vector store.
pub struct MemoryVectorStore {
    /// Units in insertion order; overwrite-by-id keeps the original slot.
    units: RwLock<Vec<IndexedUnit>>,
    dimensions: usize,
}

impl MemoryVectorStore {
    /// Create a new in-memory store for embeddings of the given length.
    pub fn new(dimensions: usize) -> Self {
        Self {
            units: RwLock::new(Vec::new()),
            dimensions,
        }
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert(&self, units: &[IndexedUnit]) -> Result<usize> {
        let mut store = self.units.write().unwrap();
        let mut stored = 0;

        for unit in units {
            if !unit.is_usable(self.dimensions) {
                continue;
            }
            match store.iter_mut().find(|u| u.id == unit.id) {
                Some(existing) => *existing = unit.clone(),
                None => store.push(unit.clone()),
            }
            stored += 1;
        }

        Ok(stored)
    }

    async fn query(
        &self,
        query_embedding: &[f32],
        k: usize,
        filter: Option<UnitKind>,
    ) -> Result<Vec<UnitMatch>> {
        let store = self.units.read().unwrap();

        let mut matches: Vec<UnitMatch> = store
            .iter()
            .filter(|u| filter.map_or(true, |kind| u.metadata.kind == kind))
            .map(|u| UnitMatch {
                id: u.id.clone(),
                text: u.text.clone(),
                metadata: u.metadata.clone(),
                distance: cosine_distance(query_embedding, &u.embedding),
            })
            .collect();

        // Stable sort keeps insertion order for equal distances.
        matches.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(k);

        Ok(matches)
    }

    async fn fetch(&self, limit: usize, filter: Option<UnitKind>) -> Result<Vec<IndexedUnit>> {
        let store = self.units.read().unwrap();

        Ok(store
            .iter()
            .filter(|u| filter.map_or(true, |kind| u.metadata.kind == kind))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.units.read().unwrap().len())
    }
}
