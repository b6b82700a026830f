use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::application::ports::embedding_provider::{
    BatchEmbeddingRequest, EmbeddingProvider, EmbeddingProviderError,
};
use crate::domain::value_objects::EmbeddingVector;

#[derive(Debug)]
pub enum EmbeddingClientError {
    InvalidInput(String),
    /// Transient: timeouts, 429/5xx, network failures, malformed responses
    ProviderUnavailable(String),
    /// The provider rejected the request and will keep doing so
    ProviderRejected(String),
}

impl EmbeddingClientError {
    pub fn is_transient(&self) -> bool {
        matches!(self, EmbeddingClientError::ProviderUnavailable(_))
    }
}

impl std::fmt::Display for EmbeddingClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingClientError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            EmbeddingClientError::ProviderUnavailable(msg) => {
                write!(f, "Embedding provider unavailable: {}", msg)
            }
            EmbeddingClientError::ProviderRejected(msg) => {
                write!(f, "Embedding provider rejected request: {}", msg)
            }
        }
    }
}

impl std::error::Error for EmbeddingClientError {}

impl From<EmbeddingProviderError> for EmbeddingClientError {
    fn from(error: EmbeddingProviderError) -> Self {
        match error {
            EmbeddingProviderError::InvalidInput(msg) => EmbeddingClientError::InvalidInput(msg),
            other if other.is_transient() => {
                EmbeddingClientError::ProviderUnavailable(other.to_string())
            }
            other => EmbeddingClientError::ProviderRejected(other.to_string()),
        }
    }
}

/// Turns texts into vectors through the configured provider, one provider
/// call per batch, each bounded by a timeout.
pub struct EmbeddingClient {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
    request_timeout: Duration,
}

impl EmbeddingClient {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        batch_size: usize,
        request_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            batch_size: batch_size.max(1),
            request_timeout,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn dimension(&self) -> usize {
        self.provider.embedding_dimension()
    }

    /// One vector per input, in input order. Any failing batch fails the call.
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>, EmbeddingClientError> {
        if let Some(position) = texts.iter().position(|text| text.trim().is_empty()) {
            return Err(EmbeddingClientError::InvalidInput(format!(
                "text at position {} is empty",
                position
            )));
        }

        let (model_name, _) = self.provider.model_info();
        let expected_dimension = self.provider.embedding_dimension();
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            let request = BatchEmbeddingRequest {
                texts: batch.to_vec(),
                model_name: Some(model_name.clone()),
            };

            let response = tokio::time::timeout(
                self.request_timeout,
                self.provider.generate_embeddings(request),
            )
            .await
            .map_err(|_| {
                EmbeddingClientError::ProviderUnavailable(format!(
                    "embedding request timed out after {:?}",
                    self.request_timeout
                ))
            })??;

            if response.embeddings.len() != batch.len() {
                return Err(EmbeddingClientError::ProviderUnavailable(format!(
                    "provider returned {} embeddings for {} texts",
                    response.embeddings.len(),
                    batch.len()
                )));
            }

            if let Some(bad) = response
                .embeddings
                .iter()
                .find(|vector| vector.dimension() != expected_dimension)
            {
                return Err(EmbeddingClientError::ProviderUnavailable(format!(
                    "provider returned a {}-dimensional vector, expected {}",
                    bad.dimension(),
                    expected_dimension
                )));
            }

            debug!(batch = batch.len(), model = %response.model_name, "Embedded batch");
            vectors.extend(response.embeddings);
        }

        Ok(vectors)
    }

    pub async fn embed_one(&self, text: &str) -> Result<EmbeddingVector, EmbeddingClientError> {
        self.embed(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| {
                EmbeddingClientError::ProviderUnavailable("provider returned no embedding".to_string())
            })
    }
}
