use axum::{Json, http::StatusCode};
use serde::Serialize;

use crate::application::ports::job_queue::QueueHealth;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(code: String, message: String, details: Option<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message,
                details,
            }),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    /// Error envelope paired with its status, ready to return from a handler.
    pub fn failure(
        status: StatusCode,
        code: &str,
        message: impl Into<String>,
    ) -> (StatusCode, Json<ApiResponse<T>>) {
        (
            status,
            Json(ApiResponse::error(code.to_string(), message.into(), None)),
        )
    }
}

#[derive(Debug, Serialize)]
pub struct ServiceInfoDto {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponseDto {
    /// `healthy` or `degraded`
    pub status: String,
    pub version: String,
    pub queue: Option<QueueHealthDto>,
    pub active_jobs: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct QueueHealthDto {
    pub pending: usize,
    pub total_enqueued: u64,
    pub total_dequeued: u64,
    pub accepting_jobs: bool,
    pub last_activity: Option<String>,
}

impl From<QueueHealth> for QueueHealthDto {
    fn from(health: QueueHealth) -> Self {
        Self {
            pending: health.queue_size,
            total_enqueued: health.total_enqueued,
            total_dequeued: health.total_dequeued,
            accepting_jobs: health.is_healthy,
            last_activity: health.last_activity.map(|dt| dt.to_rfc3339()),
        }
    }
}
