use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::ports::vector_index::{VectorIndex, VectorIndexError};
use crate::domain::entities::{Chunk, IndexedChunk, RetrievalResult, ScoredChunk};
use crate::domain::value_objects::{ChunkMetadata, EmbeddingVector};

/// Vector index backed by a Qdrant collection over its REST API.
pub struct QdrantVectorIndex {
    client: Client,
    base_url: String,
    collection: String,
}

impl QdrantVectorIndex {
    pub fn new(
        base_url: &str,
        collection: impl Into<String>,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, VectorIndexError> {
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(VectorIndexError::InvalidInput(format!(
                "Qdrant URL must be an http(s) URL: {}",
                base_url
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = api_key.map(str::trim).filter(|k| !k.is_empty()) {
            let value = HeaderValue::from_str(key)
                .map_err(|_| VectorIndexError::InvalidInput("invalid Qdrant API key".to_string()))?;
            headers.insert("api-key", value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| VectorIndexError::BackendError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            collection: collection.into(),
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.base_url, self.collection)
    }

    async fn read_body<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, VectorIndexError> {
        let status = response.status();
        if status.is_success() {
            let envelope: QdrantEnvelope<T> = response
                .json()
                .await
                .map_err(|e| VectorIndexError::BackendError(format!("malformed Qdrant response: {}", e)))?;
            return Ok(envelope.result);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<body unavailable>".to_string());
        Err(status_error(status, &self.collection, body))
    }
}

fn status_error(status: StatusCode, collection: &str, body: String) -> VectorIndexError {
    match status {
        StatusCode::NOT_FOUND => VectorIndexError::IndexUnavailable(format!(
            "collection '{}' not found",
            collection
        )),
        s if s == StatusCode::TOO_MANY_REQUESTS || s.is_server_error() => {
            VectorIndexError::BackendError(format!("Qdrant returned {}: {}", s, body))
        }
        s => VectorIndexError::InvalidInput(format!("Qdrant rejected request ({}): {}", s, body)),
    }
}

fn transport_error(error: reqwest::Error) -> VectorIndexError {
    if error.is_timeout() {
        VectorIndexError::Timeout
    } else {
        VectorIndexError::BackendError(error.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct QdrantEnvelope<T> {
    result: T,
}

#[derive(Debug, Serialize)]
struct CreateCollectionRequest {
    vectors: VectorParams,
}

#[derive(Debug, Serialize, Deserialize)]
struct VectorParams {
    size: usize,
    distance: String,
}

#[derive(Debug, Deserialize)]
struct CollectionInfo {
    config: CollectionConfig,
}

#[derive(Debug, Deserialize)]
struct CollectionConfig {
    params: CollectionParams,
}

#[derive(Debug, Deserialize)]
struct CollectionParams {
    vectors: VectorParams,
}

#[derive(Debug, Serialize)]
struct UpsertRequest {
    points: Vec<PointStruct>,
}

#[derive(Debug, Serialize)]
struct PointStruct {
    id: Uuid,
    vector: Vec<f32>,
    payload: ChunkPayload,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChunkPayload {
    text: String,
    source_document_id: String,
    sequence_index: usize,
    #[serde(default)]
    start_offset: usize,
    #[serde(default)]
    end_offset: usize,
    #[serde(default)]
    metadata: ChunkMetadata,
}

impl From<&Chunk> for ChunkPayload {
    fn from(chunk: &Chunk) -> Self {
        Self {
            text: chunk.text().to_string(),
            source_document_id: chunk.source_document_id().to_string(),
            sequence_index: chunk.sequence_index(),
            start_offset: chunk.start_offset(),
            end_offset: chunk.end_offset(),
            metadata: chunk.metadata().clone(),
        }
    }
}

impl From<ChunkPayload> for Chunk {
    fn from(payload: ChunkPayload) -> Self {
        Chunk::new(
            payload.source_document_id,
            payload.text,
            payload.sequence_index,
            payload.metadata,
            payload.start_offset,
            payload.end_offset,
        )
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    limit: usize,
    with_payload: bool,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    score: f32,
    payload: Option<ChunkPayload>,
}

#[derive(Debug, Serialize)]
struct CountRequest {
    exact: bool,
}

#[derive(Debug, Deserialize)]
struct CountResult {
    count: usize,
}

#[async_trait]
impl VectorIndex for QdrantVectorIndex {
    async fn ensure_collection(&self, dimension: usize) -> Result<(), VectorIndexError> {
        if dimension == 0 {
            return Err(VectorIndexError::InvalidInput(
                "dimension must be greater than zero".to_string(),
            ));
        }

        let response = self
            .client
            .get(self.collection_url())
            .send()
            .await
            .map_err(transport_error)?;

        match self.read_body::<CollectionInfo>(response).await {
            Ok(info) => {
                let existing = info.config.params.vectors.size;
                if existing != dimension {
                    return Err(VectorIndexError::DimensionMismatch {
                        expected: existing,
                        actual: dimension,
                    });
                }
                debug!(collection = %self.collection, dimension, "Collection already exists");
                Ok(())
            }
            Err(VectorIndexError::IndexUnavailable(_)) => {
                let request = CreateCollectionRequest {
                    vectors: VectorParams {
                        size: dimension,
                        distance: "Cosine".to_string(),
                    },
                };
                let response = self
                    .client
                    .put(self.collection_url())
                    .json(&request)
                    .send()
                    .await
                    .map_err(transport_error)?;

                // A concurrent creator may have won the race
                if response.status() == StatusCode::CONFLICT {
                    return Ok(());
                }
                self.read_body::<serde_json::Value>(response).await?;
                info!(collection = %self.collection, dimension, "Created vector collection");
                Ok(())
            }
            Err(other) => Err(other),
        }
    }

    async fn upsert(&self, items: &[IndexedChunk]) -> Result<(), VectorIndexError> {
        if items.is_empty() {
            return Ok(());
        }

        let request = UpsertRequest {
            points: items
                .iter()
                .map(|item| PointStruct {
                    id: item.id().as_uuid(),
                    vector: item.embedding().as_slice().to_vec(),
                    payload: ChunkPayload::from(item.chunk()),
                })
                .collect(),
        };

        let response = self
            .client
            .put(format!("{}/points?wait=true", self.collection_url()))
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        self.read_body::<serde_json::Value>(response).await?;
        debug!(collection = %self.collection, points = items.len(), "Upserted points");
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

        let request = SearchRequest {
            vector: query.as_slice(),
            limit: k,
            with_payload: true,
        };

        let response = self
            .client
            .post(format!("{}/points/search", self.collection_url()))
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let points: Vec<ScoredPoint> = self.read_body(response).await?;
        Ok(scored_points_to_result(points, k))
    }

    async fn count(&self) -> Result<usize, VectorIndexError> {
        let response = self
            .client
            .post(format!("{}/points/count", self.collection_url()))
            .json(&CountRequest { exact: true })
            .send()
            .await
            .map_err(transport_error)?;

        let result: CountResult = self.read_body(response).await?;
        Ok(result.count)
    }

    fn collection_name(&self) -> &str {
        &self.collection
    }
}

fn scored_points_to_result(points: Vec<ScoredPoint>, k: usize) -> RetrievalResult {
    let mut result = RetrievalResult::from_ranked(
        points
            .into_iter()
            .filter_map(|point| {
                point.payload.map(|payload| ScoredChunk {
                    chunk: Chunk::from(payload),
                    similarity_score: point.score,
                })
            })
            .collect(),
    );
    result.truncate(k);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_http_url() {
        let result = QdrantVectorIndex::new("localhost:6333", "docs", None, Duration::from_secs(1));
        assert!(matches!(result, Err(VectorIndexError::InvalidInput(_))));
    }

    #[test]
    fn test_collection_url() {
        let index =
            QdrantVectorIndex::new("http://localhost:6333/", "pdf-embeddings", Some("key"), Duration::from_secs(1))
                .unwrap();
        assert_eq!(index.collection_url(), "http://localhost:6333/collections/pdf-embeddings");
        assert_eq!(index.collection_name(), "pdf-embeddings");
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, "docs", String::new()),
            VectorIndexError::IndexUnavailable(_)
        ));
        assert!(status_error(StatusCode::SERVICE_UNAVAILABLE, "docs", String::new()).is_transient());
        assert!(!status_error(StatusCode::BAD_REQUEST, "docs", String::new()).is_transient());
    }

    #[test]
    fn test_parses_search_response() {
        let body = serde_json::json!({
            "result": [
                {
                    "id": "5c56c793-69f3-4fbf-87e6-c4bf54c28c26",
                    "version": 3,
                    "score": 0.91,
                    "payload": {
                        "text": "Ownership rules",
                        "source_document_id": "https://files.example.com/rust.pdf",
                        "sequence_index": 4,
                        "start_offset": 3200,
                        "end_offset": 3215,
                        "metadata": {"filename": "rust.pdf", "page_number": "2"}
                    }
                },
                {"id": "d2c1e54c-2bd8-4c35-9a3a-0f0b5b4c8a11", "version": 1, "score": 0.40, "payload": null}
            ],
            "status": "ok",
            "time": 0.001
        });

        let envelope: QdrantEnvelope<Vec<ScoredPoint>> = serde_json::from_value(body).unwrap();
        let result = scored_points_to_result(envelope.result, 5);

        assert_eq!(result.len(), 1);
        let hit = &result.items()[0];
        assert_eq!(hit.chunk.text(), "Ownership rules");
        assert_eq!(hit.chunk.sequence_index(), 4);
        assert_eq!(hit.chunk.metadata().page_number(), Some(2));
        assert!((hit.similarity_score - 0.91).abs() < 1e-6);
    }

    #[test]
    fn test_parses_collection_info() {
        let body = serde_json::json!({
            "result": {
                "status": "green",
                "config": {"params": {"vectors": {"size": 768, "distance": "Cosine"}}}
            }
        });

        let envelope: QdrantEnvelope<CollectionInfo> = serde_json::from_value(body).unwrap();
        assert_eq!(envelope.result.config.params.vectors.size, 768);
    }
}
