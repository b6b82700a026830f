use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::IngestionJob;

#[derive(Debug)]
pub enum JobRepositoryError {
    NotFound(Uuid),
    DatabaseError(String),
    ValidationError(String),
}

impl std::fmt::Display for JobRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobRepositoryError::NotFound(id) => write!(f, "Job not found: {}", id),
            JobRepositoryError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            JobRepositoryError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for JobRepositoryError {}

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn save(&self, job: &IngestionJob) -> Result<(), JobRepositoryError>;
    async fn find_by_id(&self, job_id: Uuid) -> Result<Option<IngestionJob>, JobRepositoryError>;
    /// Queued and running jobs, oldest first.
    async fn find_active_jobs(&self) -> Result<Vec<IngestionJob>, JobRepositoryError>;
    async fn update(&self, job: &IngestionJob) -> Result<(), JobRepositoryError>;
    /// Stores `job` only if the stored record is still queued. Returns whether
    /// this caller won the claim.
    async fn claim(&self, job: &IngestionJob) -> Result<bool, JobRepositoryError>;
    async fn count_active_jobs(&self) -> Result<i64, JobRepositoryError>;
}
