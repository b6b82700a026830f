use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::application::ports::document_extractor::{
    DocumentExtractionError, DocumentExtractor, ExtractedPage,
};
use crate::application::ports::document_source::{DocumentSource, DocumentSourceError};
use crate::application::ports::vector_index::{VectorIndex, VectorIndexError};
use crate::application::services::embedding_client::{EmbeddingClient, EmbeddingClientError};
use crate::application::services::text_splitter::TextSplitter;
use crate::domain::entities::{Chunk, IndexedChunk, IngestionJob, JobResult};
use crate::domain::value_objects::{ChunkMetadata, chunk_metadata};

#[derive(Debug)]
pub enum IngestionError {
    InvalidInput(String),
    ProviderUnavailable(String),
    IndexUnavailable(String),
    Unrecoverable(String),
}

impl IngestionError {
    /// Whether the queue should try the job again later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, IngestionError::ProviderUnavailable(_))
    }
}

impl std::fmt::Display for IngestionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestionError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            IngestionError::ProviderUnavailable(msg) => write!(f, "Provider unavailable: {}", msg),
            IngestionError::IndexUnavailable(msg) => write!(f, "Index unavailable: {}", msg),
            IngestionError::Unrecoverable(msg) => write!(f, "Ingestion failed: {}", msg),
        }
    }
}

impl std::error::Error for IngestionError {}

impl From<DocumentSourceError> for IngestionError {
    fn from(error: DocumentSourceError) -> Self {
        match error {
            DocumentSourceError::NetworkError(msg) => IngestionError::ProviderUnavailable(msg),
            DocumentSourceError::NotFound(_) | DocumentSourceError::InvalidLocator(_) => {
                IngestionError::InvalidInput(error.to_string())
            }
            DocumentSourceError::IoError(msg) => IngestionError::Unrecoverable(msg),
        }
    }
}

impl From<DocumentExtractionError> for IngestionError {
    fn from(error: DocumentExtractionError) -> Self {
        match error {
            DocumentExtractionError::UnsupportedFormat(_)
            | DocumentExtractionError::CorruptedFile(_) => {
                IngestionError::InvalidInput(error.to_string())
            }
            DocumentExtractionError::ExtractionFailed(msg) => IngestionError::Unrecoverable(msg),
        }
    }
}

impl From<EmbeddingClientError> for IngestionError {
    fn from(error: EmbeddingClientError) -> Self {
        match error {
            EmbeddingClientError::InvalidInput(msg) => IngestionError::InvalidInput(msg),
            EmbeddingClientError::ProviderUnavailable(msg) => {
                IngestionError::ProviderUnavailable(msg)
            }
            EmbeddingClientError::ProviderRejected(msg) => IngestionError::Unrecoverable(msg),
        }
    }
}

impl From<VectorIndexError> for IngestionError {
    fn from(error: VectorIndexError) -> Self {
        match error {
            VectorIndexError::IndexUnavailable(msg) => IngestionError::IndexUnavailable(msg),
            VectorIndexError::Timeout | VectorIndexError::BackendError(_) => {
                IngestionError::ProviderUnavailable(error.to_string())
            }
            VectorIndexError::DimensionMismatch { .. } | VectorIndexError::InvalidInput(_) => {
                IngestionError::Unrecoverable(error.to_string())
            }
        }
    }
}

/// Load → split → embed → upsert for a single job.
///
/// Every step is idempotent: chunk ids derive from the document reference and
/// the chunk's position, so running a job twice overwrites the same points.
/// Batches upserted before a failure stay in the index.
pub struct IngestionPipeline {
    document_source: Arc<dyn DocumentSource>,
    document_extractor: Arc<dyn DocumentExtractor>,
    embedding_client: Arc<EmbeddingClient>,
    vector_index: Arc<dyn VectorIndex>,
    text_splitter: TextSplitter,
    index_timeout: Duration,
    collection_ready: OnceCell<()>,
}

impl IngestionPipeline {
    pub fn new(
        document_source: Arc<dyn DocumentSource>,
        document_extractor: Arc<dyn DocumentExtractor>,
        embedding_client: Arc<EmbeddingClient>,
        vector_index: Arc<dyn VectorIndex>,
        text_splitter: TextSplitter,
        index_timeout: Duration,
    ) -> Self {
        Self {
            document_source,
            document_extractor,
            embedding_client,
            vector_index,
            text_splitter,
            index_timeout,
            collection_ready: OnceCell::new(),
        }
    }

    pub async fn process(&self, job: &IngestionJob) -> Result<JobResult, IngestionError> {
        let started = Instant::now();

        if !self.document_extractor.can_extract(job.mime_type()) {
            return Err(IngestionError::InvalidInput(format!(
                "unsupported document type: {}",
                job.mime_type()
            )));
        }

        let bytes = self.document_source.fetch(job.document_reference()).await?;
        if let Some(max) = self.document_extractor.max_file_size() {
            if bytes.len() > max {
                return Err(IngestionError::InvalidInput(format!(
                    "document is {} bytes, limit is {}",
                    bytes.len(),
                    max
                )));
            }
        }

        let document = self
            .document_extractor
            .extract_from_bytes(&bytes, job.mime_type())
            .await?;
        debug!(job_id = %job.id(), pages = document.pages.len(), "Extracted document");

        let chunks = self.build_chunks(job, &document.pages);
        if chunks.is_empty() {
            info!(job_id = %job.id(), "Document has no text, nothing to index");
            return Ok(JobResult {
                chunks_created: 0,
                pages_processed: document.page_count,
                extracted_text_length: document.text_length(),
                processing_time_ms: started.elapsed().as_millis() as u64,
            });
        }

        self.ensure_collection().await?;

        for batch in chunks.chunks(self.embedding_client.batch_size()) {
            let texts: Vec<String> = batch.iter().map(|c| c.text().to_string()).collect();
            let vectors = self.embedding_client.embed(&texts).await?;

            let items: Vec<IndexedChunk> = batch
                .iter()
                .cloned()
                .zip(vectors)
                .map(|(chunk, vector)| IndexedChunk::new(chunk, vector))
                .collect();

            self.upsert_batch(&items).await?;
            debug!(job_id = %job.id(), batch = items.len(), "Upserted batch");
        }

        Ok(JobResult {
            chunks_created: chunks.len(),
            pages_processed: document.page_count,
            extracted_text_length: document.text_length(),
            processing_time_ms: started.elapsed().as_millis() as u64,
        })
    }

    fn build_chunks(
        &self,
        job: &IngestionJob,
        pages: &[ExtractedPage],
    ) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for page in pages {
            for segment in self.text_splitter.split(&page.text) {
                if segment.text.trim().is_empty() {
                    continue;
                }

                let sequence_index = chunks.len();
                let metadata = ChunkMetadata::new()
                    .with_property(chunk_metadata::FILENAME_KEY, job.filename())
                    .with_property(chunk_metadata::SOURCE_KEY, job.document_reference())
                    .with_property(chunk_metadata::SEQUENCE_INDEX_KEY, sequence_index.to_string())
                    .with_property(chunk_metadata::PAGE_NUMBER_KEY, page.page_number.to_string())
                    .with_property(chunk_metadata::MIME_TYPE_KEY, job.mime_type());

                chunks.push(Chunk::new(
                    job.document_reference().to_string(),
                    segment.text,
                    sequence_index,
                    metadata,
                    segment.start,
                    segment.end,
                ));
            }
        }

        chunks
    }

    async fn ensure_collection(&self) -> Result<(), IngestionError> {
        self.collection_ready
            .get_or_try_init(|| async { self.create_collection().await })
            .await?;
        Ok(())
    }

    async fn create_collection(&self) -> Result<(), IngestionError> {
        let dimension = self.embedding_client.dimension();
        tokio::time::timeout(self.index_timeout, self.vector_index.ensure_collection(dimension))
            .await
            .map_err(|_| IngestionError::ProviderUnavailable("ensure_collection timed out".to_string()))??;
        Ok(())
    }

    async fn upsert_batch(&self, items: &[IndexedChunk]) -> Result<(), IngestionError> {
        match self.timed_upsert(items).await {
            Err(IngestionError::IndexUnavailable(msg)) => {
                warn!(
                    collection = self.vector_index.collection_name(),
                    error = %msg,
                    "Collection missing during upsert, recreating once"
                );
                self.create_collection().await?;
                self.timed_upsert(items).await
            }
            other => other,
        }
    }

    async fn timed_upsert(&self, items: &[IndexedChunk]) -> Result<(), IngestionError> {
        tokio::time::timeout(self.index_timeout, self.vector_index.upsert(items))
            .await
            .map_err(|_| IngestionError::ProviderUnavailable("upsert timed out".to_string()))??;
        Ok(())
    }
}
