use axum::{Router, routing::get, routing::post};
use std::sync::Arc;

use crate::presentation::http::handlers::JobHandler;

pub fn job_routes(job_handler: Arc<JobHandler>) -> Router {
    Router::new()
        .route("/jobs", post(JobHandler::submit_job))
        .route("/jobs/active", get(JobHandler::get_active_jobs))
        .route("/jobs/{job_id}", get(JobHandler::get_job_status))
        .with_state(job_handler)
}
