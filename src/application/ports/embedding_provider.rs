use async_trait::async_trait;

use crate::domain::value_objects::EmbeddingVector;

#[derive(Debug)]
pub enum EmbeddingProviderError {
    NetworkError(String),
    /// A 4xx the provider will keep rejecting (bad key, bad model, bad body)
    ApiError(String),
    InvalidInput(String),
    RateLimitExceeded,
    ServiceUnavailable(String),
    Timeout,
    MalformedResponse(String),
}

impl EmbeddingProviderError {
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EmbeddingProviderError::NetworkError(_)
                | EmbeddingProviderError::RateLimitExceeded
                | EmbeddingProviderError::ServiceUnavailable(_)
                | EmbeddingProviderError::Timeout
                | EmbeddingProviderError::MalformedResponse(_)
        )
    }
}

impl std::fmt::Display for EmbeddingProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingProviderError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            EmbeddingProviderError::ApiError(msg) => write!(f, "API error: {}", msg),
            EmbeddingProviderError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            EmbeddingProviderError::RateLimitExceeded => write!(f, "Rate limit exceeded"),
            EmbeddingProviderError::ServiceUnavailable(msg) => {
                write!(f, "Service unavailable: {}", msg)
            }
            EmbeddingProviderError::Timeout => write!(f, "Embedding request timed out"),
            EmbeddingProviderError::MalformedResponse(msg) => {
                write!(f, "Malformed embedding response: {}", msg)
            }
        }
    }
}

impl std::error::Error for EmbeddingProviderError {}

#[derive(Debug, Clone)]
pub struct BatchEmbeddingRequest {
    pub texts: Vec<String>,
    pub model_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BatchEmbeddingResponse {
    pub embeddings: Vec<EmbeddingVector>,
    pub model_name: String,
}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// One vector per input text, in input order.
    async fn generate_embeddings(
        &self,
        request: BatchEmbeddingRequest,
    ) -> Result<BatchEmbeddingResponse, EmbeddingProviderError>;

    fn model_info(&self) -> (String, Option<String>);

    fn embedding_dimension(&self) -> usize;
}
