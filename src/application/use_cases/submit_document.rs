use std::sync::Arc;
use uuid::Uuid;

use crate::application::ports::{DocumentExtractor, JobQueue, job_queue::JobQueueError};
use crate::domain::entities::{IngestionJob, JobPayload};
use crate::domain::repositories::{JobRepository, job_repository::JobRepositoryError};

#[derive(Debug)]
pub enum SubmitDocumentError {
    RepositoryError(String),
    QueueError(String),
    ValidationError(String),
}

impl std::fmt::Display for SubmitDocumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitDocumentError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
            SubmitDocumentError::QueueError(msg) => write!(f, "Queue error: {}", msg),
            SubmitDocumentError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for SubmitDocumentError {}

impl From<JobRepositoryError> for SubmitDocumentError {
    fn from(error: JobRepositoryError) -> Self {
        SubmitDocumentError::RepositoryError(error.to_string())
    }
}

impl From<JobQueueError> for SubmitDocumentError {
    fn from(error: JobQueueError) -> Self {
        SubmitDocumentError::QueueError(error.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct SubmitDocumentResponse {
    pub job_id: Uuid,
    pub status: String,
    pub message: String,
}

/// The only thing the upload side sees of ingestion: hand over a payload,
/// get a job id back.
pub struct SubmitDocumentUseCase {
    job_repository: Arc<dyn JobRepository>,
    job_queue: Arc<dyn JobQueue>,
    document_extractor: Arc<dyn DocumentExtractor>,
}

impl SubmitDocumentUseCase {
    pub fn new(
        job_repository: Arc<dyn JobRepository>,
        job_queue: Arc<dyn JobQueue>,
        document_extractor: Arc<dyn DocumentExtractor>,
    ) -> Self {
        Self {
            job_repository,
            job_queue,
            document_extractor,
        }
    }

    pub async fn execute(
        &self,
        payload: JobPayload,
    ) -> Result<SubmitDocumentResponse, SubmitDocumentError> {
        self.validate(&payload)?;

        // A document already waiting or running does not need a second job
        let active = self.job_repository.find_active_jobs().await?;
        if active
            .iter()
            .any(|job| job.document_reference() == payload.path.trim())
        {
            return Err(SubmitDocumentError::ValidationError(
                "Document already has an active ingestion job".to_string(),
            ));
        }

        let job = IngestionJob::new(JobPayload {
            filename: payload.filename.trim().to_string(),
            path: payload.path.trim().to_string(),
            mime_type: payload.mime_type.trim().to_lowercase(),
        });

        self.job_repository.save(&job).await?;
        self.job_queue.enqueue(job.clone()).await?;

        Ok(SubmitDocumentResponse {
            job_id: job.id(),
            status: job.status().to_string(),
            message: "Document queued for ingestion".to_string(),
        })
    }

    fn validate(&self, payload: &JobPayload) -> Result<(), SubmitDocumentError> {
        if payload.filename.trim().is_empty() {
            return Err(SubmitDocumentError::ValidationError(
                "Filename cannot be empty".to_string(),
            ));
        }

        let path = payload.path.trim();
        if path.is_empty() {
            return Err(SubmitDocumentError::ValidationError(
                "Document path cannot be empty".to_string(),
            ));
        }
        if path.contains("://") && url::Url::parse(path).is_err() {
            return Err(SubmitDocumentError::ValidationError(
                "Invalid document URL".to_string(),
            ));
        }

        let mime_type = payload.mime_type.trim().to_lowercase();
        if !self.document_extractor.can_extract(&mime_type) {
            return Err(SubmitDocumentError::ValidationError(format!(
                "Unsupported document type: {}",
                payload.mime_type
            )));
        }

        Ok(())
    }
}
