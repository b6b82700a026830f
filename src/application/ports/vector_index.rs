use async_trait::async_trait;

use crate::domain::entities::{IndexedChunk, RetrievalResult};
use crate::domain::value_objects::EmbeddingVector;

#[derive(Debug)]
pub enum VectorIndexError {
    /// The collection does not exist (or the backend lost it)
    IndexUnavailable(String),
    DimensionMismatch { expected: usize, actual: usize },
    InvalidInput(String),
    Timeout,
    BackendError(String),
}

impl VectorIndexError {
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            VectorIndexError::Timeout | VectorIndexError::BackendError(_)
        )
    }
}

impl std::fmt::Display for VectorIndexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorIndexError::IndexUnavailable(msg) => write!(f, "Index unavailable: {}", msg),
            VectorIndexError::DimensionMismatch { expected, actual } => write!(
                f,
                "Dimension mismatch: collection expects {}, got {}",
                expected, actual
            ),
            VectorIndexError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            VectorIndexError::Timeout => write!(f, "Vector index request timed out"),
            VectorIndexError::BackendError(msg) => write!(f, "Vector backend error: {}", msg),
        }
    }
}

impl std::error::Error for VectorIndexError {}

/// A named collection of embedded chunks with a fixed dimensionality.
///
/// Upserts are idempotent on the chunk id: re-upserting replaces the vector
/// and payload but keeps the entry's original insertion position, which is
/// the tie breaker for equal similarity scores. Once `upsert` returns, the
/// items are visible to every later `search`.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Creates the collection if missing. An existing collection with another
    /// dimensionality is a `DimensionMismatch`.
    async fn ensure_collection(&self, dimension: usize) -> Result<(), VectorIndexError>;

    async fn upsert(&self, items: &[IndexedChunk]) -> Result<(), VectorIndexError>;

    /// Top `k` by cosine similarity, best first. Returns fewer than `k` when
    /// the collection is smaller.
    async fn search(
        &self,
        query: &EmbeddingVector,
        k: usize,
    ) -> Result<RetrievalResult, VectorIndexError>;

    async fn count(&self) -> Result<usize, VectorIndexError>;

    fn collection_name(&self) -> &str;
}
