use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::entities::JobResult;

#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    Started {
        job_id: Uuid,
        attempt: u32,
    },
    Succeeded {
        job_id: Uuid,
        result: JobResult,
    },
    Retrying {
        job_id: Uuid,
        attempt: u32,
        delay_ms: u64,
        error: String,
    },
    Failed {
        job_id: Uuid,
        attempt: u32,
        error: String,
    },
}

impl JobEvent {
    pub fn job_id(&self) -> Uuid {
        match self {
            JobEvent::Started { job_id, .. }
            | JobEvent::Succeeded { job_id, .. }
            | JobEvent::Retrying { job_id, .. }
            | JobEvent::Failed { job_id, .. } => *job_id,
        }
    }
}

/// Logs every job lifecycle event until the channel closes.
pub fn spawn_event_logger(mut events: broadcast::Receiver<JobEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => log_event(&event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Job event logger fell behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

fn log_event(event: &JobEvent) {
    match event {
        JobEvent::Started { job_id, attempt } => {
            info!(%job_id, attempt, "Job started");
        }
        JobEvent::Succeeded { job_id, result } => {
            info!(
                %job_id,
                chunks = result.chunks_created,
                pages = result.pages_processed,
                elapsed_ms = result.processing_time_ms,
                "Job succeeded"
            );
        }
        JobEvent::Retrying {
            job_id,
            attempt,
            delay_ms,
            error,
        } => {
            warn!(%job_id, attempt, delay_ms, error = %error, "Job failed, retrying");
        }
        JobEvent::Failed {
            job_id,
            attempt,
            error,
        } => {
            error!(%job_id, attempt, error = %error, "Job failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_logger_stops_when_senders_drop() {
        let (sender, receiver) = broadcast::channel(4);
        let handle = spawn_event_logger(receiver);

        let job_id = Uuid::new_v4();
        sender.send(JobEvent::Started { job_id, attempt: 1 }).unwrap();
        drop(sender);

        handle.await.unwrap();
    }

    #[test]
    fn test_job_id_accessor() {
        let job_id = Uuid::new_v4();
        let event = JobEvent::Failed {
            job_id,
            attempt: 3,
            error: "boom".to_string(),
        };
        assert_eq!(event.job_id(), job_id);
    }
}
