use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::use_cases::{
    GetJobStatusUseCase, SubmitDocumentUseCase, get_job_status::GetJobStatusError,
    submit_document::SubmitDocumentError,
};
use crate::presentation::http::dto::{
    ApiResponse, JobStatusDto, SubmitJobRequestDto, SubmitJobResponseDto,
};

pub struct JobHandler {
    submit_document_use_case: Arc<SubmitDocumentUseCase>,
    get_job_status_use_case: Arc<GetJobStatusUseCase>,
}

impl JobHandler {
    pub fn new(
        submit_document_use_case: Arc<SubmitDocumentUseCase>,
        get_job_status_use_case: Arc<GetJobStatusUseCase>,
    ) -> Self {
        Self {
            submit_document_use_case,
            get_job_status_use_case,
        }
    }

    // Queue a document for ingestion
    pub async fn submit_job(
        State(handler): State<Arc<JobHandler>>,
        Json(request): Json<SubmitJobRequestDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.submit_document_use_case.execute(request.into()).await {
            Ok(response) => {
                let dto = SubmitJobResponseDto::from(response);
                Ok((StatusCode::ACCEPTED, Json(ApiResponse::success(dto))))
            }
            Err(e) => {
                let (status, code) = match &e {
                    SubmitDocumentError::ValidationError(_) => {
                        (StatusCode::BAD_REQUEST, "INVALID_REQUEST")
                    }
                    SubmitDocumentError::QueueError(_) => {
                        (StatusCode::SERVICE_UNAVAILABLE, "QUEUE_UNAVAILABLE")
                    }
                    SubmitDocumentError::RepositoryError(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "SUBMIT_FAILED")
                    }
                };
                tracing::warn!("Job submission rejected: {}", e);
                Ok(ApiResponse::failure(status, code, e.to_string()))
            }
        }
    }

    // Get job status
    pub async fn get_job_status(
        State(handler): State<Arc<JobHandler>>,
        Path(job_id): Path<Uuid>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.get_job_status_use_case.execute(job_id).await {
            Ok(response) => {
                let dto = JobStatusDto::from(response);
                Ok((StatusCode::OK, Json(ApiResponse::success(dto))))
            }
            Err(GetJobStatusError::JobNotFound(id)) => Ok(ApiResponse::failure(
                StatusCode::NOT_FOUND,
                "JOB_NOT_FOUND",
                format!("Job not found: {}", id),
            )),
            Err(e) => Ok(ApiResponse::failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "JOB_LOOKUP_FAILED",
                e.to_string(),
            )),
        }
    }

    // Get all queued and running jobs
    pub async fn get_active_jobs(
        State(handler): State<Arc<JobHandler>>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.get_job_status_use_case.get_active_jobs().await {
            Ok(jobs) => {
                let dtos: Vec<JobStatusDto> = jobs.into_iter().map(JobStatusDto::from_job).collect();
                Ok((StatusCode::OK, Json(ApiResponse::success(dtos))))
            }
            Err(e) => Ok(ApiResponse::failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "JOB_LOOKUP_FAILED",
                e.to_string(),
            )),
        }
    }
}
