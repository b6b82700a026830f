use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

use crate::application::ports::JobQueue;
use crate::domain::repositories::JobRepository;
use crate::presentation::http::dto::{ApiResponse, HealthResponseDto, QueueHealthDto, ServiceInfoDto};

pub struct HealthHandler {
    job_queue: Arc<dyn JobQueue>,
    job_repository: Arc<dyn JobRepository>,
}

impl HealthHandler {
    pub fn new(job_queue: Arc<dyn JobQueue>, job_repository: Arc<dyn JobRepository>) -> Self {
        Self {
            job_queue,
            job_repository,
        }
    }

    pub async fn root() -> impl IntoResponse {
        let info = ServiceInfoDto {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        };
        (StatusCode::OK, Json(ApiResponse::success(info)))
    }

    /// Degraded when the workers stopped taking jobs or job storage is
    /// unreachable.
    pub async fn health(State(handler): State<Arc<HealthHandler>>) -> impl IntoResponse {
        let queue = match handler.job_queue.health_check().await {
            Ok(health) => Some(QueueHealthDto::from(health)),
            Err(e) => {
                tracing::warn!("Queue health check failed: {}", e);
                None
            }
        };
        let active_jobs = match handler.job_repository.count_active_jobs().await {
            Ok(count) => Some(count),
            Err(e) => {
                tracing::warn!("Job storage health check failed: {}", e);
                None
            }
        };

        let healthy = queue.as_ref().is_some_and(|q| q.accepting_jobs) && active_jobs.is_some();
        let response = HealthResponseDto {
            status: if healthy { "healthy" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            queue,
            active_jobs,
        };
        let status = if healthy {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };

        (status, Json(ApiResponse::success(response)))
    }
}
