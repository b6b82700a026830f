use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::application::ports::vector_index::{VectorIndex, VectorIndexError};
use crate::domain::entities::{IndexedChunk, RetrievalResult, ScoredChunk};
use crate::domain::value_objects::{ChunkId, EmbeddingVector};

struct Entry {
    // Insertion position, kept across re-upserts of the same id
    seq: u64,
    item: Arc<IndexedChunk>,
}

struct Collection {
    dimension: usize,
    entries: HashMap<ChunkId, Entry>,
    next_seq: u64,
}

/// Process-local vector index for tests and single-node development runs.
pub struct InMemoryVectorIndex {
    name: String,
    collection: RwLock<Option<Collection>>,
}

impl InMemoryVectorIndex {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collection: RwLock::new(None),
        }
    }

    #[cfg(test)]
    pub async fn drop_collection(&self) {
        *self.collection.write().await = None;
    }

    fn unavailable(&self) -> VectorIndexError {
        VectorIndexError::IndexUnavailable(format!("collection '{}' does not exist", self.name))
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn ensure_collection(&self, dimension: usize) -> Result<(), VectorIndexError> {
        if dimension == 0 {
            return Err(VectorIndexError::InvalidInput(
                "dimension must be greater than zero".to_string(),
            ));
        }

        let mut guard = self.collection.write().await;
        match guard.as_ref() {
            Some(existing) if existing.dimension != dimension => {
                Err(VectorIndexError::DimensionMismatch {
                    expected: existing.dimension,
                    actual: dimension,
                })
            }
            Some(_) => Ok(()),
            None => {
                *guard = Some(Collection {
                    dimension,
                    entries: HashMap::new(),
                    next_seq: 0,
                });
                Ok(())
            }
        }
    }

    async fn upsert(&self, items: &[IndexedChunk]) -> Result<(), VectorIndexError> {
        let mut guard = self.collection.write().await;
        let collection = guard.as_mut().ok_or_else(|| self.unavailable())?;

        // Validate the whole batch before touching anything
        if let Some(bad) = items.iter().find(|i| i.dimension() != collection.dimension) {
            return Err(VectorIndexError::DimensionMismatch {
                expected: collection.dimension,
                actual: bad.dimension(),
            });
        }

        for item in items {
            let item_arc = Arc::new(item.clone());
            match collection.entries.get_mut(&item.id()) {
                Some(entry) => entry.item = item_arc,
                None => {
                    let seq = collection.next_seq;
                    collection.next_seq += 1;
                    collection.entries.insert(item.id(), Entry { seq, item: item_arc });
                }
            }
        }

        Ok(())
    }

    async fn search(
        &self,
        query: &EmbeddingVector,
        k: usize,
    ) -> Result<RetrievalResult, VectorIndexError> {
        if k == 0 {
            return Ok(RetrievalResult::empty());
        }

        // Snapshot under the read lock, score without it
        let snapshot: Vec<(u64, Arc<IndexedChunk>)> = {
            let guard = self.collection.read().await;
            let collection = guard.as_ref().ok_or_else(|| self.unavailable())?;
            if query.dimension() != collection.dimension {
                return Err(VectorIndexError::DimensionMismatch {
                    expected: collection.dimension,
                    actual: query.dimension(),
                });
            }
            collection
                .entries
                .values()
                .map(|entry| (entry.seq, entry.item.clone()))
                .collect()
        };

        let mut scored: Vec<(u64, f32, Arc<IndexedChunk>)> = snapshot
            .into_iter()
            .map(|(seq, item)| (seq, query.cosine_similarity(item.embedding()), item))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);

        Ok(RetrievalResult::from_ranked(
            scored
                .into_iter()
                .map(|(_, score, item)| ScoredChunk {
                    chunk: item.chunk().clone(),
                    similarity_score: score,
                })
                .collect(),
        ))
    }

    async fn count(&self) -> Result<usize, VectorIndexError> {
        let guard = self.collection.read().await;
        let collection = guard.as_ref().ok_or_else(|| self.unavailable())?;
        Ok(collection.entries.len())
    }

    fn collection_name(&self) -> &str {
        &self.name
    }
}
