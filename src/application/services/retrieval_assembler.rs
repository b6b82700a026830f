use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::application::ports::vector_index::{VectorIndex, VectorIndexError};
use crate::application::services::embedding_client::{EmbeddingClient, EmbeddingClientError};
use crate::domain::entities::RetrievalResult;

/// Separator between chunks in a rendered context block
pub const CONTEXT_SEPARATOR: &str = "\n\n";

#[derive(Debug)]
pub enum RetrievalError {
    InvalidInput(String),
    ProviderUnavailable(String),
    IndexUnavailable(String),
}

impl std::fmt::Display for RetrievalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetrievalError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            RetrievalError::ProviderUnavailable(msg) => write!(f, "Provider unavailable: {}", msg),
            RetrievalError::IndexUnavailable(msg) => write!(f, "Index unavailable: {}", msg),
        }
    }
}

impl std::error::Error for RetrievalError {}

impl From<EmbeddingClientError> for RetrievalError {
    fn from(error: EmbeddingClientError) -> Self {
        match error {
            EmbeddingClientError::InvalidInput(msg) => RetrievalError::InvalidInput(msg),
            other => RetrievalError::ProviderUnavailable(other.to_string()),
        }
    }
}

pub struct RetrievalAssembler {
    embedding_client: Arc<EmbeddingClient>,
    vector_index: Arc<dyn VectorIndex>,
    search_timeout: Duration,
}

impl RetrievalAssembler {
    pub fn new(
        embedding_client: Arc<EmbeddingClient>,
        vector_index: Arc<dyn VectorIndex>,
        search_timeout: Duration,
    ) -> Self {
        Self {
            embedding_client,
            vector_index,
            search_timeout,
        }
    }

    /// Top `k` chunks for `query`, best first. A collection that does not exist
    /// yet means nothing has been ingested, which is an empty result rather
    /// than an error.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<RetrievalResult, RetrievalError> {
        if query.trim().is_empty() {
            return Err(RetrievalError::InvalidInput("query is empty".to_string()));
        }
        if k == 0 {
            return Ok(RetrievalResult::empty());
        }

        let query_vector = self.embedding_client.embed_one(query).await?;

        let search = tokio::time::timeout(self.search_timeout, self.vector_index.search(&query_vector, k))
            .await
            .map_err(|_| RetrievalError::ProviderUnavailable("vector search timed out".to_string()))?;

        match search {
            Ok(mut result) => {
                result.truncate(k);
                debug!(k, hits = result.len(), "Retrieved context");
                Ok(result)
            }
            Err(VectorIndexError::IndexUnavailable(msg)) => {
                warn!(
                    collection = self.vector_index.collection_name(),
                    error = %msg,
                    "Collection not available, continuing without context"
                );
                Ok(RetrievalResult::empty())
            }
            Err(VectorIndexError::InvalidInput(msg)) => Err(RetrievalError::InvalidInput(msg)),
            Err(other) => Err(RetrievalError::IndexUnavailable(other.to_string())),
        }
    }

    /// Chunk texts in ranking order, separated by a blank line.
    pub fn render_context(result: &RetrievalResult) -> String {
        result
            .chunks()
            .map(|chunk| chunk.text())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR)
    }
}
