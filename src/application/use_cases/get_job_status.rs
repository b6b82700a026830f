use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::IngestionJob;
use crate::domain::repositories::{JobRepository, job_repository::JobRepositoryError};

#[derive(Debug)]
pub enum GetJobStatusError {
    JobNotFound(Uuid),
    RepositoryError(String),
}

impl std::fmt::Display for GetJobStatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GetJobStatusError::JobNotFound(id) => write!(f, "Job not found: {}", id),
            GetJobStatusError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
        }
    }
}

impl std::error::Error for GetJobStatusError {}

impl From<JobRepositoryError> for GetJobStatusError {
    fn from(error: JobRepositoryError) -> Self {
        match error {
            JobRepositoryError::NotFound(id) => GetJobStatusError::JobNotFound(id),
            _ => GetJobStatusError::RepositoryError(error.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GetJobStatusResponse {
    pub job: IngestionJob,
    pub duration: Option<chrono::Duration>,
}

pub struct GetJobStatusUseCase {
    job_repository: Arc<dyn JobRepository>,
}

impl GetJobStatusUseCase {
    pub fn new(job_repository: Arc<dyn JobRepository>) -> Self {
        Self { job_repository }
    }

    pub async fn execute(&self, job_id: Uuid) -> Result<GetJobStatusResponse, GetJobStatusError> {
        let job = self
            .job_repository
            .find_by_id(job_id)
            .await?
            .ok_or(GetJobStatusError::JobNotFound(job_id))?;

        Ok(GetJobStatusResponse {
            duration: job.duration(),
            job,
        })
    }

    pub async fn get_active_jobs(&self) -> Result<Vec<IngestionJob>, GetJobStatusError> {
        self.job_repository
            .find_active_jobs()
            .await
            .map_err(GetJobStatusError::from)
    }
}
