use async_trait::async_trait;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::IngestionJob;
use crate::domain::repositories::{JobRepository, job_repository::JobRepositoryError};
use crate::infrastructure::database::models::{JobModel, NewJobModel, UpdateJobModel};
use crate::infrastructure::database::schema::ingestion_jobs;
use crate::infrastructure::database::{DbPool, connection::DbConnection, get_connection_from_pool};

const ACTIVE_STATUSES: [&str; 2] = ["queued", "running"];

pub struct PostgresJobRepository {
    pool: DbPool,
}

impl PostgresJobRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn get_connection(&self) -> Result<DbConnection, JobRepositoryError> {
        get_connection_from_pool(&self.pool).map_err(|e| {
            JobRepositoryError::DatabaseError(format!("Failed to get database connection: {}", e))
        })
    }
}

fn to_domain(models: Vec<JobModel>) -> Result<Vec<IngestionJob>, JobRepositoryError> {
    models
        .into_iter()
        .map(|model| {
            IngestionJob::try_from(model).map_err(|e| {
                JobRepositoryError::DatabaseError(format!("Failed to convert job model: {}", e))
            })
        })
        .collect()
}

#[async_trait]
impl JobRepository for PostgresJobRepository {
    async fn save(&self, job: &IngestionJob) -> Result<(), JobRepositoryError> {
        let new_job = NewJobModel::try_from(job).map_err(JobRepositoryError::ValidationError)?;
        let mut conn = self.get_connection()?;

        tokio::task::spawn_blocking(move || {
            diesel::insert_into(ingestion_jobs::table)
                .values(&new_job)
                .execute(&mut conn)
                .map_err(|e| JobRepositoryError::DatabaseError(format!("Failed to save job: {}", e)))
        })
        .await
        .map_err(|e| JobRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        Ok(())
    }

    async fn find_by_id(&self, job_id: Uuid) -> Result<Option<IngestionJob>, JobRepositoryError> {
        let mut conn = self.get_connection()?;

        let result = tokio::task::spawn_blocking(move || {
            ingestion_jobs::table
                .filter(ingestion_jobs::id.eq(job_id))
                .select(JobModel::as_select())
                .first::<JobModel>(&mut conn)
                .optional()
                .map_err(|e| JobRepositoryError::DatabaseError(format!("Failed to find job: {}", e)))
        })
        .await
        .map_err(|e| JobRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        match result {
            Some(model) => Ok(to_domain(vec![model])?.pop()),
            None => Ok(None),
        }
    }

    async fn find_active_jobs(&self) -> Result<Vec<IngestionJob>, JobRepositoryError> {
        let mut conn = self.get_connection()?;

        let models = tokio::task::spawn_blocking(move || {
            ingestion_jobs::table
                .filter(ingestion_jobs::status.eq_any(ACTIVE_STATUSES))
                .order(ingestion_jobs::created_at.asc())
                .select(JobModel::as_select())
                .load::<JobModel>(&mut conn)
                .map_err(|e| {
                    JobRepositoryError::DatabaseError(format!("Failed to find active jobs: {}", e))
                })
        })
        .await
        .map_err(|e| JobRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        to_domain(models)
    }

    async fn update(&self, job: &IngestionJob) -> Result<(), JobRepositoryError> {
        let update_job = UpdateJobModel::try_from(job).map_err(JobRepositoryError::ValidationError)?;
        let job_id = job.id();
        let mut conn = self.get_connection()?;

        let updated = tokio::task::spawn_blocking(move || {
            diesel::update(ingestion_jobs::table.filter(ingestion_jobs::id.eq(job_id)))
                .set(&update_job)
                .execute(&mut conn)
                .map_err(|e| JobRepositoryError::DatabaseError(format!("Failed to update job: {}", e)))
        })
        .await
        .map_err(|e| JobRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        if updated == 0 {
            return Err(JobRepositoryError::NotFound(job_id));
        }
        Ok(())
    }

    async fn claim(&self, job: &IngestionJob) -> Result<bool, JobRepositoryError> {
        let update_job = UpdateJobModel::try_from(job).map_err(JobRepositoryError::ValidationError)?;
        let job_id = job.id();
        let mut conn = self.get_connection()?;

        let updated = tokio::task::spawn_blocking(move || {
            diesel::update(
                ingestion_jobs::table
                    .filter(ingestion_jobs::id.eq(job_id))
                    .filter(ingestion_jobs::status.eq("queued")),
            )
            .set(&update_job)
            .execute(&mut conn)
            .map_err(|e| JobRepositoryError::DatabaseError(format!("Failed to claim job: {}", e)))
        })
        .await
        .map_err(|e| JobRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        Ok(updated == 1)
    }

    async fn count_active_jobs(&self) -> Result<i64, JobRepositoryError> {
        let mut conn = self.get_connection()?;

        tokio::task::spawn_blocking(move || {
            ingestion_jobs::table
                .filter(ingestion_jobs::status.eq_any(ACTIVE_STATUSES))
                .count()
                .get_result::<i64>(&mut conn)
                .map_err(|e| JobRepositoryError::DatabaseError(format!("Failed to count jobs: {}", e)))
        })
        .await
        .map_err(|e| JobRepositoryError::DatabaseError(format!("Task join error: {}", e)))?
    }
}
