use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::entities::{IngestionJob, JobResult};
use crate::domain::value_objects::JobStatus;
use crate::infrastructure::database::schema::ingestion_jobs;

#[derive(Debug, Queryable, Identifiable, Selectable)]
#[diesel(table_name = ingestion_jobs)]
#[diesel(primary_key(id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct JobModel {
    pub id: uuid::Uuid,
    pub document_reference: String,
    pub filename: String,
    pub mime_type: String,
    pub status: String,
    pub attempt_count: i32,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub result_summary: Option<serde_json::Value>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = ingestion_jobs)]
pub struct NewJobModel {
    pub id: uuid::Uuid,
    pub document_reference: String,
    pub filename: String,
    pub mime_type: String,
    pub status: String,
    pub attempt_count: i32,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub result_summary: Option<serde_json::Value>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = ingestion_jobs)]
pub struct UpdateJobModel {
    pub status: Option<String>,
    pub attempt_count: Option<i32>,
    pub started_at: Option<Option<DateTime<Utc>>>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
    pub error_message: Option<Option<String>>,
    pub result_summary: Option<Option<serde_json::Value>>,
}

fn stored_error_message(job: &IngestionJob) -> Option<String> {
    // Failed status carries its error in the error_message column
    match job.status() {
        JobStatus::Failed(error) => Some(error.clone()),
        _ => job.error_message().map(|s| s.to_string()),
    }
}

fn stored_result_summary(job: &IngestionJob) -> Result<Option<serde_json::Value>, String> {
    job.result_summary()
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| format!("Failed to serialize result summary: {}", e))
}

impl TryFrom<&IngestionJob> for NewJobModel {
    type Error = String;

    fn try_from(job: &IngestionJob) -> Result<Self, Self::Error> {
        Ok(Self {
            id: job.id(),
            document_reference: job.document_reference().to_string(),
            filename: job.filename().to_string(),
            mime_type: job.mime_type().to_string(),
            status: job.status().as_str().to_string(),
            attempt_count: job.attempt_count() as i32,
            created_at: job.created_at(),
            started_at: job.started_at(),
            completed_at: job.completed_at(),
            error_message: stored_error_message(job),
            result_summary: stored_result_summary(job)?,
        })
    }
}

impl TryFrom<&IngestionJob> for UpdateJobModel {
    type Error = String;

    fn try_from(job: &IngestionJob) -> Result<Self, Self::Error> {
        Ok(Self {
            status: Some(job.status().as_str().to_string()),
            attempt_count: Some(job.attempt_count() as i32),
            started_at: Some(job.started_at()),
            completed_at: Some(job.completed_at()),
            error_message: Some(stored_error_message(job)),
            result_summary: Some(stored_result_summary(job)?),
        })
    }
}

impl TryFrom<JobModel> for IngestionJob {
    type Error = String;

    fn try_from(model: JobModel) -> Result<Self, Self::Error> {
        let status = JobStatus::from_parts(&model.status, model.error_message.as_deref())?;

        let result_summary = model
            .result_summary
            .map(serde_json::from_value::<JobResult>)
            .transpose()
            .map_err(|e| format!("Failed to parse result summary: {}", e))?;

        let attempt_count = u32::try_from(model.attempt_count)
            .map_err(|_| format!("Invalid attempt count: {}", model.attempt_count))?;

        Ok(IngestionJob::from_storage(
            model.id,
            model.document_reference,
            model.filename,
            model.mime_type,
            status,
            attempt_count,
            model.created_at,
            model.started_at,
            model.completed_at,
            model.error_message,
            result_summary,
        ))
    }
}
