use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded,
    Failed(String),
}

impl JobStatus {
    pub fn is_queued(&self) -> bool {
        matches!(self, JobStatus::Queued)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, JobStatus::Running)
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, JobStatus::Succeeded)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, JobStatus::Failed(_))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed(_))
    }

    pub fn can_transition_to(&self, new_status: &JobStatus) -> bool {
        match (self, new_status) {
            (JobStatus::Queued, JobStatus::Running) => true,
            (JobStatus::Running, JobStatus::Succeeded) => true,
            (JobStatus::Running, JobStatus::Failed(_)) => true,
            // Redelivery by the queue after a failed attempt
            (JobStatus::Failed(_), JobStatus::Queued) => true,
            // Reclaim after a worker crash
            (JobStatus::Running, JobStatus::Queued) => true,
            _ => false,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            JobStatus::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Succeeded => "succeeded",
            // Error details live in the job's error_message column
            JobStatus::Failed(_) => "failed",
        }
    }

    pub fn from_parts(status: &str, error_message: Option<&str>) -> Result<Self, String> {
        match status.to_lowercase().as_str() {
            "queued" => Ok(JobStatus::Queued),
            "running" => Ok(JobStatus::Running),
            "succeeded" => Ok(JobStatus::Succeeded),
            "failed" => Ok(JobStatus::Failed(
                error_message.unwrap_or("Unknown error").to_string(),
            )),
            other => Err(format!("Invalid job status: {}", other)),
        }
    }
}

impl Default for JobStatus {
    fn default() -> Self {
        JobStatus::Queued
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
