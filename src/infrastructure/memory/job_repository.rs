use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::IngestionJob;
use crate::domain::repositories::{JobRepository, JobRepositoryError};

/// Job records kept in process memory. Used when no database is configured.
#[derive(Default)]
pub struct InMemoryJobRepository {
    jobs: RwLock<HashMap<Uuid, IngestionJob>>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn save(&self, job: &IngestionJob) -> Result<(), JobRepositoryError> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id()) {
            return Err(JobRepositoryError::ValidationError(format!(
                "Job {} already exists",
                job.id()
            )));
        }
        jobs.insert(job.id(), job.clone());
        Ok(())
    }

    async fn find_by_id(&self, job_id: Uuid) -> Result<Option<IngestionJob>, JobRepositoryError> {
        Ok(self.jobs.read().await.get(&job_id).cloned())
    }

    async fn find_active_jobs(&self) -> Result<Vec<IngestionJob>, JobRepositoryError> {
        let mut active: Vec<IngestionJob> = self
            .jobs
            .read()
            .await
            .values()
            .filter(|job| job.is_active())
            .cloned()
            .collect();
        active.sort_by_key(|job| job.created_at());
        Ok(active)
    }

    async fn update(&self, job: &IngestionJob) -> Result<(), JobRepositoryError> {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(&job.id()) {
            Some(stored) => {
                *stored = job.clone();
                Ok(())
            }
            None => Err(JobRepositoryError::NotFound(job.id())),
        }
    }

    async fn claim(&self, job: &IngestionJob) -> Result<bool, JobRepositoryError> {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(&job.id()) {
            Some(stored) if stored.status().is_queued() => {
                *stored = job.clone();
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(JobRepositoryError::NotFound(job.id())),
        }
    }

    async fn count_active_jobs(&self) -> Result<i64, JobRepositoryError> {
        let jobs = self.jobs.read().await;
        Ok(jobs.values().filter(|job| job.is_active()).count() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::JobPayload;

    fn job(name: &str) -> IngestionJob {
        IngestionJob::new(JobPayload {
            filename: name.to_string(),
            path: format!("/data/{}", name),
            mime_type: "application/pdf".to_string(),
        })
    }

    #[tokio::test]
    async fn test_save_find_update() {
        let repository = InMemoryJobRepository::new();
        let mut job = job("a.pdf");

        repository.save(&job).await.unwrap();
        assert!(repository.save(&job).await.is_err());

        job.start().unwrap();
        repository.update(&job).await.unwrap();

        let stored = repository.find_by_id(job.id()).await.unwrap().unwrap();
        assert!(stored.status().is_running());
        assert!(repository.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_unknown_job() {
        let repository = InMemoryJobRepository::new();
        assert!(matches!(
            repository.update(&job("a.pdf")).await,
            Err(JobRepositoryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_claim_succeeds_once() {
        let repository = InMemoryJobRepository::new();
        let job = job("a.pdf");
        repository.save(&job).await.unwrap();

        let mut first = job.clone();
        first.start().unwrap();
        let mut second = job.clone();
        second.start().unwrap();

        assert!(repository.claim(&first).await.unwrap());
        assert!(!repository.claim(&second).await.unwrap());
    }

    #[tokio::test]
    async fn test_active_jobs_oldest_first() {
        let repository = InMemoryJobRepository::new();
        let queued_at = |minutes_ago: i64, name: &str| {
            IngestionJob::from_storage(
                Uuid::new_v4(),
                format!("/data/{}", name),
                name.to_string(),
                "application/pdf".to_string(),
                crate::domain::value_objects::JobStatus::Queued,
                0,
                chrono::Utc::now() - chrono::Duration::minutes(minutes_ago),
                None,
                None,
                None,
                None,
            )
        };
        let older = queued_at(10, "old.pdf");
        let newer = queued_at(1, "new.pdf");
        let mut done = job("done.pdf");
        done.start().unwrap();
        done.fail("boom".to_string()).unwrap();

        repository.save(&newer).await.unwrap();
        repository.save(&done).await.unwrap();
        repository.save(&older).await.unwrap();

        let active = repository.find_active_jobs().await.unwrap();
        let ids: Vec<Uuid> = active.iter().map(|j| j.id()).collect();
        assert_eq!(ids, vec![older.id(), newer.id()]);
        assert_eq!(repository.count_active_jobs().await.unwrap(), 2);
    }
}
