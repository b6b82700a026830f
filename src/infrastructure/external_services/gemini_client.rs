use async_trait::async_trait;
use reqwest::{Client, Error as ReqwestError, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use crate::application::ports::embedding_provider::{
    BatchEmbeddingRequest, BatchEmbeddingResponse, EmbeddingProvider, EmbeddingProviderError,
};
use crate::application::ports::generation_provider::{
    GenerationProvider, GenerationProviderError, GenerationRequest, GenerationResponse,
};
use crate::domain::entities::{Prompt, TurnRole};
use crate::domain::value_objects::EmbeddingVector;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

// Wire types for the Generative Language REST API

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct EmbedContentRequest {
    model: String,
    content: Content,
}

#[derive(Debug, Serialize)]
struct BatchEmbedContentsRequest {
    requests: Vec<EmbedContentRequest>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedContentsResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Clone)]
pub struct GeminiClientConfig {
    pub base_url: String,
    pub api_key: String,
    /// Extra attempts after a network-level failure. HTTP error statuses are
    /// never retried here.
    pub max_retries: u32,
    pub timeout_secs: u64,
    pub backoff_factor: f64,
}

impl GeminiClientConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            max_retries: 1,
            timeout_secs: 60,
            backoff_factor: 1.5,
        }
    }
}

#[derive(Debug)]
pub enum GeminiError {
    Network(String),
    Timeout,
    Status { status: u16, message: String },
    Parse(String),
}

impl std::fmt::Display for GeminiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeminiError::Network(msg) => write!(f, "Network error: {}", msg),
            GeminiError::Timeout => write!(f, "Request timed out"),
            GeminiError::Status { status, message } => write!(f, "HTTP {}: {}", status, message),
            GeminiError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl From<GeminiError> for EmbeddingProviderError {
    fn from(error: GeminiError) -> Self {
        match error {
            GeminiError::Network(msg) => EmbeddingProviderError::NetworkError(msg),
            GeminiError::Timeout => EmbeddingProviderError::Timeout,
            GeminiError::Status { status: 429, .. } => EmbeddingProviderError::RateLimitExceeded,
            GeminiError::Status { status, message } if status >= 500 => {
                EmbeddingProviderError::ServiceUnavailable(format!("HTTP {}: {}", status, message))
            }
            GeminiError::Status { status, message } => {
                EmbeddingProviderError::ApiError(format!("HTTP {}: {}", status, message))
            }
            GeminiError::Parse(msg) => EmbeddingProviderError::MalformedResponse(msg),
        }
    }
}

impl From<GeminiError> for GenerationProviderError {
    fn from(error: GeminiError) -> Self {
        match error {
            GeminiError::Network(msg) => GenerationProviderError::NetworkError(msg),
            GeminiError::Timeout => GenerationProviderError::Timeout,
            GeminiError::Status { status: 429, .. } => GenerationProviderError::RateLimitExceeded,
            GeminiError::Status { status, message } if status >= 500 => {
                GenerationProviderError::ServiceUnavailable(format!("HTTP {}: {}", status, message))
            }
            GeminiError::Status { status, message } => {
                GenerationProviderError::ApiError(format!("HTTP {}: {}", status, message))
            }
            GeminiError::Parse(msg) => GenerationProviderError::MalformedResponse(msg),
        }
    }
}

/// Thin REST client shared by the embedding and generation adapters.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    config: GeminiClientConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiClientConfig) -> Result<Self, ReqwestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.config.base_url.trim_end_matches('/'),
            model,
            method
        )
    }

    async fn post<B, R>(&self, url: &str, body: &B) -> Result<R, GeminiError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let mut attempts = 0;

        loop {
            attempts += 1;

            match self.execute_request(url, body).await {
                Err(e @ (GeminiError::Network(_) | GeminiError::Timeout))
                    if attempts <= self.config.max_retries =>
                {
                    let backoff_time = Duration::from_millis(
                        (self.config.backoff_factor.powi(attempts as i32 - 1) * 500.0) as u64,
                    );
                    warn!(error = %e, attempt = attempts, "Gemini request failed, retrying");
                    tokio::time::sleep(backoff_time).await;
                }
                result => return result,
            }
        }
    }

    async fn execute_request<B, R>(&self, url: &str, body: &B) -> Result<R, GeminiError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeminiError::Timeout
                } else {
                    GeminiError::Network(e.without_url().to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(status_error(status, message));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| GeminiError::Parse(e.without_url().to_string()))
    }
}

fn status_error(status: StatusCode, message: String) -> GeminiError {
    let message: String = message.chars().take(300).collect();
    GeminiError::Status {
        status: status.as_u16(),
        message,
    }
}

fn role_name(role: TurnRole) -> &'static str {
    match role {
        TurnRole::User => "user",
        TurnRole::Assistant => "model",
    }
}

fn build_generate_request(request: &GenerationRequest) -> GenerateContentRequest {
    let Prompt {
        system_instruction,
        turns,
    } = &request.prompt;

    let generation_config = if request.temperature.is_some() || request.max_output_tokens.is_some() {
        Some(GenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request.max_output_tokens,
        })
    } else {
        None
    };

    GenerateContentRequest {
        system_instruction: system_instruction.as_ref().map(|text| Content {
            role: None,
            parts: vec![Part { text: text.clone() }],
        }),
        contents: turns
            .iter()
            .map(|turn| Content {
                role: Some(role_name(turn.role)),
                parts: vec![Part {
                    text: turn.text.clone(),
                }],
            })
            .collect(),
        generation_config,
    }
}

fn response_text(response: GenerateContentResponse) -> Result<String, GeminiError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| GeminiError::Parse("response has no candidates".to_string()))?;

    Ok(candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default())
}

pub struct GeminiEmbeddingProvider {
    client: GeminiClient,
    model: String,
    dimension: usize,
}

impl GeminiEmbeddingProvider {
    pub fn new(client: GeminiClient, model: String, dimension: usize) -> Self {
        Self {
            client,
            model,
            dimension,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddingProvider {
    async fn generate_embeddings(
        &self,
        request: BatchEmbeddingRequest,
    ) -> Result<BatchEmbeddingResponse, EmbeddingProviderError> {
        let model = request.model_name.unwrap_or_else(|| self.model.clone());
        let model_path = format!("models/{}", model);

        let body = BatchEmbedContentsRequest {
            requests: request
                .texts
                .into_iter()
                .map(|text| EmbedContentRequest {
                    model: model_path.clone(),
                    content: Content {
                        role: None,
                        parts: vec![Part { text }],
                    },
                })
                .collect(),
        };

        let url = self.client.endpoint(&model, "batchEmbedContents");
        let response: BatchEmbedContentsResponse = self.client.post(&url, &body).await?;

        Ok(BatchEmbeddingResponse {
            embeddings: response
                .embeddings
                .into_iter()
                .map(|embedding| EmbeddingVector::new(embedding.values))
                .collect(),
            model_name: model,
        })
    }

    fn model_info(&self) -> (String, Option<String>) {
        (self.model.clone(), None)
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }
}

pub struct GeminiGenerationProvider {
    client: GeminiClient,
    model: String,
}

impl GeminiGenerationProvider {
    pub fn new(client: GeminiClient, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl GenerationProvider for GeminiGenerationProvider {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationProviderError> {
        let body = build_generate_request(&request);
        let url = self.client.endpoint(&self.model, "generateContent");

        let response: GenerateContentResponse = self.client.post(&url, &body).await?;

        Ok(GenerationResponse {
            text: response_text(response)?,
            model_name: self.model.clone(),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
