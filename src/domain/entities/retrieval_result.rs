use serde::Serialize;

use crate::domain::entities::Chunk;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub similarity_score: f32,
}

/// Chunks returned for one query, best match first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RetrievalResult {
    items: Vec<ScoredChunk>,
}

impl RetrievalResult {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wraps already-ranked hits. Callers are responsible for the ordering;
    /// the sort here is stable so insertion-order tie breaks survive.
    pub fn from_ranked(mut items: Vec<ScoredChunk>) -> Self {
        items.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));
        Self { items }
    }

    pub fn items(&self) -> &[ScoredChunk] {
        &self.items
    }

    pub fn into_items(self) -> Vec<ScoredChunk> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.items.iter().map(|item| &item.chunk)
    }

    pub fn truncate(&mut self, k: usize) {
        self.items.truncate(k);
    }
}
