use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::JobStatus;

/// What the upload collaborator hands over when a document is ready.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPayload {
    pub filename: String,
    pub path: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub chunks_created: usize,
    pub pages_processed: usize,
    pub extracted_text_length: usize,
    pub processing_time_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionJob {
    id: Uuid,
    document_reference: String,
    filename: String,
    mime_type: String,
    status: JobStatus,
    attempt_count: u32,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    error_message: Option<String>,
    result_summary: Option<JobResult>,
}

impl IngestionJob {
    pub fn new(payload: JobPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_reference: payload.path,
            filename: payload.filename,
            mime_type: payload.mime_type,
            status: JobStatus::Queued,
            attempt_count: 0,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            error_message: None,
            result_summary: None,
        }
    }

    /// Rebuilds a job from stored values (for repository reconstruction).
    #[allow(clippy::too_many_arguments)]
    pub fn from_storage(
        id: Uuid,
        document_reference: String,
        filename: String,
        mime_type: String,
        status: JobStatus,
        attempt_count: u32,
        created_at: DateTime<Utc>,
        started_at: Option<DateTime<Utc>>,
        completed_at: Option<DateTime<Utc>>,
        error_message: Option<String>,
        result_summary: Option<JobResult>,
    ) -> Self {
        Self {
            id,
            document_reference,
            filename,
            mime_type,
            status,
            attempt_count,
            created_at,
            started_at,
            completed_at,
            error_message,
            result_summary,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn document_reference(&self) -> &str {
        &self.document_reference
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn status(&self) -> &JobStatus {
        &self.status
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn result_summary(&self) -> Option<&JobResult> {
        self.result_summary.as_ref()
    }

    // Business logic methods

    /// Claims the job for a worker. Each claim counts as one attempt.
    pub fn start(&mut self) -> Result<(), String> {
        self.transition(JobStatus::Running)?;
        self.attempt_count += 1;
        self.started_at = Some(Utc::now());
        self.completed_at = None;
        Ok(())
    }

    pub fn complete(&mut self, result: JobResult) -> Result<(), String> {
        self.transition(JobStatus::Succeeded)?;
        self.completed_at = Some(Utc::now());
        self.result_summary = Some(result);
        self.error_message = None;
        Ok(())
    }

    pub fn fail(&mut self, error: String) -> Result<(), String> {
        self.transition(JobStatus::Failed(error.clone()))?;
        self.completed_at = Some(Utc::now());
        self.error_message = Some(error);
        Ok(())
    }

    /// Puts a failed job back in the queue. The last error stays visible
    /// until the next attempt finishes.
    pub fn requeue(&mut self) -> Result<(), String> {
        if !self.status.is_failed() {
            return Err(format!("Only failed jobs can be requeued, job is {}", self.status));
        }
        self.transition(JobStatus::Queued)?;
        self.completed_at = None;
        Ok(())
    }

    /// Releases a job whose worker disappeared mid-run (process restart).
    /// The interrupted attempt still counts.
    pub fn reclaim(&mut self) -> Result<(), String> {
        if !self.status.is_running() {
            return Err(format!("Only running jobs can be reclaimed, job is {}", self.status));
        }
        self.transition(JobStatus::Queued)
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, JobStatus::Queued | JobStatus::Running)
    }

    pub fn has_attempts_left(&self, max_attempts: u32) -> bool {
        self.attempt_count < max_attempts
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end - start),
            (Some(start), None) if self.status.is_running() => Some(Utc::now() - start),
            _ => None,
        }
    }

    fn transition(&mut self, next: JobStatus) -> Result<(), String> {
        if !self.status.can_transition_to(&next) {
            return Err(format!(
                "Invalid job transition {} -> {} for job {}",
                self.status, next, self.id
            ));
        }
        self.status = next;
        Ok(())
    }
}
