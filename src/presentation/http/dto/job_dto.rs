use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::use_cases::{
    get_job_status::GetJobStatusResponse, submit_document::SubmitDocumentResponse,
};
use crate::domain::entities::{IngestionJob, JobPayload, JobResult};

#[derive(Debug, Deserialize)]
pub struct SubmitJobRequestDto {
    pub filename: String,
    /// URL or filesystem path of the document.
    pub path: String,
    pub mime_type: String,
}

impl From<SubmitJobRequestDto> for JobPayload {
    fn from(dto: SubmitJobRequestDto) -> Self {
        Self {
            filename: dto.filename,
            path: dto.path,
            mime_type: dto.mime_type,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitJobResponseDto {
    pub job_id: Uuid,
    pub status: String,
    pub message: String,
}

impl From<SubmitDocumentResponse> for SubmitJobResponseDto {
    fn from(response: SubmitDocumentResponse) -> Self {
        Self {
            job_id: response.job_id,
            status: response.status,
            message: response.message,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JobStatusDto {
    pub job_id: Uuid,
    pub filename: String,
    pub document_reference: String,
    pub mime_type: String,
    pub status: String,
    pub attempt_count: u32,
    pub created_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub error_message: Option<String>,
    pub result_summary: Option<JobResultDto>,
    pub duration_ms: Option<i64>,
    pub is_terminal: bool,
}

#[derive(Debug, Serialize)]
pub struct JobResultDto {
    pub chunks_created: usize,
    pub pages_processed: usize,
    pub extracted_text_length: usize,
    pub processing_time_ms: u64,
}

impl From<GetJobStatusResponse> for JobStatusDto {
    fn from(response: GetJobStatusResponse) -> Self {
        Self::from_job_with_duration(response.job, response.duration)
    }
}

impl JobStatusDto {
    pub fn from_job(job: IngestionJob) -> Self {
        let duration = job.duration();
        Self::from_job_with_duration(job, duration)
    }

    fn from_job_with_duration(job: IngestionJob, duration: Option<chrono::Duration>) -> Self {
        Self {
            job_id: job.id(),
            filename: job.filename().to_string(),
            document_reference: job.document_reference().to_string(),
            mime_type: job.mime_type().to_string(),
            status: job.status().as_str().to_string(),
            attempt_count: job.attempt_count(),
            created_at: job.created_at().to_rfc3339(),
            started_at: job.started_at().map(|dt| dt.to_rfc3339()),
            completed_at: job.completed_at().map(|dt| dt.to_rfc3339()),
            error_message: job.error_message().map(|s| s.to_string()),
            result_summary: job.result_summary().map(JobResultDto::from),
            duration_ms: duration.map(|d| d.num_milliseconds()),
            is_terminal: job.status().is_terminal(),
        }
    }
}

impl From<&JobResult> for JobResultDto {
    fn from(result: &JobResult) -> Self {
        Self {
            chunks_created: result.chunks_created,
            pages_processed: result.pages_processed,
            extracted_text_length: result.extracted_text_length,
            processing_time_ms: result.processing_time_ms,
        }
    }
}
