use async_trait::async_trait;

use crate::domain::entities::Prompt;

#[derive(Debug)]
pub enum GenerationProviderError {
    NetworkError(String),
    ApiError(String),
    RateLimitExceeded,
    ServiceUnavailable(String),
    Timeout,
    MalformedResponse(String),
}

impl GenerationProviderError {
    pub fn is_transient(&self) -> bool {
        !matches!(self, GenerationProviderError::ApiError(_))
    }
}

impl std::fmt::Display for GenerationProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationProviderError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            GenerationProviderError::ApiError(msg) => write!(f, "API error: {}", msg),
            GenerationProviderError::RateLimitExceeded => write!(f, "Rate limit exceeded"),
            GenerationProviderError::ServiceUnavailable(msg) => {
                write!(f, "Service unavailable: {}", msg)
            }
            GenerationProviderError::Timeout => write!(f, "Generation request timed out"),
            GenerationProviderError::MalformedResponse(msg) => {
                write!(f, "Malformed generation response: {}", msg)
            }
        }
    }
}

impl std::error::Error for GenerationProviderError {}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: Prompt,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

impl GenerationRequest {
    pub fn new(prompt: Prompt) -> Self {
        Self {
            prompt,
            temperature: None,
            max_output_tokens: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationResponse {
    pub text: String,
    pub model_name: String,
}

#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationProviderError>;

    fn model_name(&self) -> &str;
}
