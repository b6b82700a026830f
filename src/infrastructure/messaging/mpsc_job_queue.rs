use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

use crate::application::ports::job_queue::{JobQueue, JobQueueError, QueueHealth};
use crate::domain::entities::IngestionJob;

/// In-process job queue. The sending half is shared with use cases, the
/// receiving half with the background workers.
pub struct MpscJobQueue {
    sender: mpsc::UnboundedSender<IngestionJob>,
    stats: Arc<Mutex<QueueStats>>,
}

#[derive(Debug, Clone, Default)]
struct QueueStats {
    pending: usize,
    total_enqueued: u64,
    total_dequeued: u64,
    last_activity: Option<chrono::DateTime<chrono::Utc>>,
}

impl MpscJobQueue {
    pub fn create_pair() -> (Self, MpscJobQueueReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let stats = Arc::new(Mutex::new(QueueStats::default()));

        let queue = Self {
            sender,
            stats: stats.clone(),
        };
        let receiver = MpscJobQueueReceiver {
            receiver: Mutex::new(receiver),
            stats,
        };

        (queue, receiver)
    }
}

#[async_trait]
impl JobQueue for MpscJobQueue {
    async fn enqueue(&self, job: IngestionJob) -> Result<(), JobQueueError> {
        if !job.status().is_queued() {
            return Err(JobQueueError::InvalidJob(format!(
                "job {} is {}, only queued jobs can be enqueued",
                job.id(),
                job.status()
            )));
        }

        // Count before sending so a fast worker never sees a negative backlog
        let mut stats = self.stats.lock().await;
        self.sender
            .send(job)
            .map_err(|_| JobQueueError::ConnectionError("Channel closed".to_string()))?;
        stats.pending += 1;
        stats.total_enqueued += 1;
        stats.last_activity = Some(chrono::Utc::now());

        Ok(())
    }

    async fn size(&self) -> Result<usize, JobQueueError> {
        Ok(self.stats.lock().await.pending)
    }

    async fn health_check(&self) -> Result<QueueHealth, JobQueueError> {
        let stats = self.stats.lock().await;

        Ok(QueueHealth {
            queue_size: stats.pending,
            total_enqueued: stats.total_enqueued,
            total_dequeued: stats.total_dequeued,
            is_healthy: !self.sender.is_closed(),
            last_activity: stats.last_activity,
        })
    }
}

/// Receiving half, shared by all workers. Each job is delivered to exactly one of them.
pub struct MpscJobQueueReceiver {
    receiver: Mutex<mpsc::UnboundedReceiver<IngestionJob>>,
    stats: Arc<Mutex<QueueStats>>,
}

impl MpscJobQueueReceiver {
    /// Waits for the next job. `None` once every sender is gone.
    pub async fn recv(&self) -> Option<IngestionJob> {
        let job = {
            let mut receiver = self.receiver.lock().await;
            receiver.recv().await
        }?;

        let mut stats = self.stats.lock().await;
        stats.pending = stats.pending.saturating_sub(1);
        stats.total_dequeued += 1;
        stats.last_activity = Some(chrono::Utc::now());

        Some(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::JobPayload;

    fn job(name: &str) -> IngestionJob {
        IngestionJob::new(JobPayload {
            filename: name.to_string(),
            path: format!("/data/{}", name),
            mime_type: "application/pdf".to_string(),
        })
    }

    #[tokio::test]
    async fn test_delivers_in_order_and_tracks_backlog() {
        let (queue, receiver) = MpscJobQueue::create_pair();
        let first = job("a.pdf");
        let second = job("b.pdf");

        queue.enqueue(first.clone()).await.unwrap();
        queue.enqueue(second.clone()).await.unwrap();
        assert_eq!(queue.size().await.unwrap(), 2);

        assert_eq!(receiver.recv().await.unwrap().id(), first.id());
        assert_eq!(queue.size().await.unwrap(), 1);
        assert_eq!(receiver.recv().await.unwrap().id(), second.id());

        let health = queue.health_check().await.unwrap();
        assert_eq!(health.queue_size, 0);
        assert_eq!(health.total_enqueued, 2);
        assert_eq!(health.total_dequeued, 2);
        assert!(health.is_healthy);
    }

    #[tokio::test]
    async fn test_enqueue_fails_without_receiver() {
        let (queue, receiver) = MpscJobQueue::create_pair();
        drop(receiver);

        assert!(matches!(
            queue.enqueue(job("a.pdf")).await,
            Err(JobQueueError::ConnectionError(_))
        ));
        assert!(!queue.health_check().await.unwrap().is_healthy);
    }

    #[tokio::test]
    async fn test_rejects_running_jobs() {
        let (queue, _receiver) = MpscJobQueue::create_pair();
        let mut running = job("a.pdf");
        running.start().unwrap();

        assert!(matches!(
            queue.enqueue(running).await,
            Err(JobQueueError::InvalidJob(_))
        ));
    }

    #[tokio::test]
    async fn test_recv_ends_when_queue_dropped() {
        let (queue, receiver) = MpscJobQueue::create_pair();
        drop(queue);

        assert!(receiver.recv().await.is_none());
    }
}
