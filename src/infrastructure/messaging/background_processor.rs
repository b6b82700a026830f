use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::application::ports::job_queue::JobQueue;
use crate::application::services::IngestionPipeline;
use crate::domain::entities::IngestionJob;
use crate::domain::repositories::{JobRepository, job_repository::JobRepositoryError};
use crate::infrastructure::messaging::MpscJobQueueReceiver;
use crate::infrastructure::messaging::job_events::JobEvent;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Bounded exponential backoff for transient ingestion failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// `base * 2^(attempt-1)`, capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(60),
        }
    }
}

pub struct BackgroundProcessor {
    job_receiver: Arc<MpscJobQueueReceiver>,
    job_queue: Arc<dyn JobQueue>,
    job_repository: Arc<dyn JobRepository>,
    pipeline: Arc<IngestionPipeline>,
    events: broadcast::Sender<JobEvent>,
    retry_policy: RetryPolicy,
    worker_count: usize,
}

impl BackgroundProcessor {
    pub fn new(
        job_receiver: Arc<MpscJobQueueReceiver>,
        job_queue: Arc<dyn JobQueue>,
        job_repository: Arc<dyn JobRepository>,
        pipeline: Arc<IngestionPipeline>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            job_receiver,
            job_queue,
            job_repository,
            pipeline,
            events,
            retry_policy: RetryPolicy::default(),
            worker_count: 3,
        }
    }

    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count.max(1);
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = RetryPolicy {
            max_attempts: policy.max_attempts.max(1),
            ..policy
        };
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.events.subscribe()
    }

    /// Re-enqueues jobs a previous process left queued or running. Running
    /// jobs are reclaimed first; their interrupted attempt still counts, so a
    /// running job that used its last attempt is failed instead.
    pub async fn recover_pending_jobs(&self) -> Result<usize, JobRepositoryError> {
        let mut recovered = 0;

        for mut job in self.job_repository.find_active_jobs().await? {
            if job.status().is_running() && !job.has_attempts_left(self.retry_policy.max_attempts) {
                let job_id = job.id();
                let attempt = job.attempt_count();
                let message = "attempt budget exhausted after restart".to_string();
                if let Err(e) = job.fail(message.clone()) {
                    warn!(%job_id, error = %e, "Could not fail exhausted job");
                    continue;
                }
                self.job_repository.update(&job).await?;
                warn!(%job_id, attempt, "Interrupted job has no attempts left");
                self.emit(JobEvent::Failed {
                    job_id,
                    attempt,
                    error: message,
                });
                continue;
            }

            if job.status().is_running() {
                if let Err(e) = job.reclaim() {
                    warn!(job_id = %job.id(), error = %e, "Could not reclaim job");
                    continue;
                }
                self.job_repository.update(&job).await?;
            }

            let job_id = job.id();
            match self.job_queue.enqueue(job).await {
                Ok(()) => recovered += 1,
                Err(e) => error!(%job_id, error = %e, "Failed to re-enqueue recovered job"),
            }
        }

        if recovered > 0 {
            info!(recovered, "Recovered pending jobs");
        }
        Ok(recovered)
    }

    /// Runs the workers until the queue closes.
    pub async fn start(self: Arc<Self>) {
        info!(workers = self.worker_count, "Starting background processor");

        let mut handles = Vec::with_capacity(self.worker_count);
        for worker_id in 0..self.worker_count {
            let processor = self.clone();
            handles.push(tokio::spawn(async move {
                processor.worker_loop(worker_id).await;
            }));
        }

        for (worker_id, handle) in handles.into_iter().enumerate() {
            if let Err(e) = handle.await {
                error!(worker_id, error = %e, "Worker panicked");
            }
        }

        info!("Background processor stopped");
    }

    async fn worker_loop(&self, worker_id: usize) {
        debug!(worker_id, "Worker started");

        while let Some(job) = self.job_receiver.recv().await {
            debug!(worker_id, job_id = %job.id(), "Worker picked up job");
            self.process_job(job).await;
        }

        debug!(worker_id, "Worker stopped");
    }

    async fn process_job(&self, delivered: IngestionJob) {
        let job_id = delivered.id();

        let mut job = match self.job_repository.find_by_id(job_id).await {
            Ok(Some(job)) if job.status().is_queued() => job,
            Ok(Some(job)) => {
                debug!(%job_id, status = %job.status(), "Skipping job that is not queued");
                return;
            }
            Ok(None) => {
                warn!(%job_id, "Skipping job with no stored record");
                return;
            }
            Err(e) => {
                error!(%job_id, error = %e, "Failed to load job");
                return;
            }
        };

        if let Err(e) = job.start() {
            error!(%job_id, error = %e, "Failed to start job");
            return;
        }
        // Duplicate deliveries lose the claim here
        match self.job_repository.claim(&job).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(%job_id, "Job already claimed by another worker");
                return;
            }
            Err(e) => {
                error!(%job_id, error = %e, "Failed to persist job claim");
                return;
            }
        }
        self.emit(JobEvent::Started {
            job_id,
            attempt: job.attempt_count(),
        });

        match self.pipeline.process(&job).await {
            Ok(result) => {
                if let Err(e) = job.complete(result.clone()) {
                    error!(%job_id, error = %e, "Failed to complete job");
                    return;
                }
                self.save(&job).await;
                self.emit(JobEvent::Succeeded { job_id, result });
            }
            Err(e) => {
                let message = e.to_string();
                let attempt = job.attempt_count();
                if let Err(err) = job.fail(message.clone()) {
                    error!(%job_id, error = %err, "Failed to record job failure");
                    return;
                }

                if e.is_retryable() && job.has_attempts_left(self.retry_policy.max_attempts) {
                    self.schedule_retry(job, message).await;
                } else {
                    self.save(&job).await;
                    self.emit(JobEvent::Failed {
                        job_id,
                        attempt,
                        error: message,
                    });
                }
            }
        }
    }

    async fn schedule_retry(&self, mut job: IngestionJob, error: String) {
        let job_id = job.id();
        let attempt = job.attempt_count();

        if let Err(e) = job.requeue() {
            error!(%job_id, error = %e, "Failed to requeue job");
            self.save(&job).await;
            return;
        }
        self.save(&job).await;

        let delay = self.retry_policy.delay_for(attempt);
        self.emit(JobEvent::Retrying {
            job_id,
            attempt,
            delay_ms: delay.as_millis() as u64,
            error,
        });

        let queue = self.job_queue.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = queue.enqueue(job).await {
                error!(%job_id, error = %e, "Failed to re-enqueue job for retry");
            }
        });
    }

    async fn save(&self, job: &IngestionJob) {
        if let Err(e) = self.job_repository.update(job).await {
            error!(job_id = %job.id(), error = %e, "Failed to save job state");
        }
    }

    fn emit(&self, event: JobEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::vector_index::VectorIndex;
    use crate::application::services::{EmbeddingClient, RetrievalAssembler, TextSplitter};
    use crate::domain::entities::JobPayload;
    use crate::domain::value_objects::JobStatus;
    use crate::infrastructure::external_services::document_extractors::CompositeDocumentExtractor;
    use crate::infrastructure::memory::InMemoryJobRepository;
    use crate::infrastructure::messaging::MpscJobQueue;
    use crate::infrastructure::vector_store::InMemoryVectorIndex;
    use crate::test_support::{FakeEmbeddingProvider, StaticDocumentSource, sample_document};

    const DOC: &str = "mem://handbook.txt";

    struct Harness {
        processor: Arc<BackgroundProcessor>,
        queue: Arc<MpscJobQueue>,
        repository: Arc<InMemoryJobRepository>,
        index: Arc<InMemoryVectorIndex>,
        client: Arc<EmbeddingClient>,
    }

    fn harness(provider: FakeEmbeddingProvider) -> Harness {
        let source = StaticDocumentSource::new().with_document(DOC, sample_document(3000));
        let client = Arc::new(EmbeddingClient::new(
            Arc::new(provider),
            8,
            Duration::from_secs(5),
        ));
        let index = Arc::new(InMemoryVectorIndex::new("handbook"));
        let pipeline = Arc::new(IngestionPipeline::new(
            Arc::new(source),
            Arc::new(CompositeDocumentExtractor::new()),
            client.clone(),
            index.clone(),
            TextSplitter::new(1000, 200).unwrap(),
            Duration::from_secs(5),
        ));

        let (queue, receiver) = MpscJobQueue::create_pair();
        let queue = Arc::new(queue);
        let repository = Arc::new(InMemoryJobRepository::new());

        let processor = Arc::new(
            BackgroundProcessor::new(Arc::new(receiver), queue.clone(), repository.clone(), pipeline)
                .with_worker_count(2)
                .with_retry_policy(RetryPolicy {
                    max_attempts: 3,
                    base_delay: Duration::from_millis(10),
                    max_delay: Duration::from_millis(50),
                }),
        );

        Harness {
            processor,
            queue,
            repository,
            index,
            client,
        }
    }

    fn job(path: &str) -> IngestionJob {
        IngestionJob::new(JobPayload {
            filename: "handbook.txt".to_string(),
            path: path.to_string(),
            mime_type: "text/plain".to_string(),
        })
    }

    async fn submit(h: &Harness, job: IngestionJob) {
        h.repository.save(&job).await.unwrap();
        h.queue.enqueue(job).await.unwrap();
    }

    /// Collects events until one is terminal for the job.
    async fn events_until_done(events: &mut broadcast::Receiver<JobEvent>) -> Vec<JobEvent> {
        let mut seen = Vec::new();
        tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let event = events.recv().await.unwrap();
                let done = matches!(event, JobEvent::Succeeded { .. } | JobEvent::Failed { .. });
                seen.push(event);
                if done {
                    break;
                }
            }
        })
        .await
        .unwrap();
        seen
    }

    #[test]
    fn test_retry_delay_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
        };

        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(350));
        assert_eq!(policy.delay_for(30), Duration::from_millis(350));
    }

    #[tokio::test]
    async fn test_document_is_ingested_and_retrievable() {
        let h = harness(FakeEmbeddingProvider::new(32));
        let mut events = h.processor.subscribe();
        tokio::spawn(h.processor.clone().start());

        let job = job(DOC);
        let job_id = job.id();
        submit(&h, job).await;
        assert!(h.repository.find_by_id(job_id).await.unwrap().unwrap().status().is_queued());

        let seen = events_until_done(&mut events).await;
        assert!(matches!(seen[0], JobEvent::Started { attempt: 1, .. }));
        assert!(matches!(seen.last(), Some(JobEvent::Succeeded { .. })));

        let stored = h.repository.find_by_id(job_id).await.unwrap().unwrap();
        assert_eq!(stored.status(), &JobStatus::Succeeded);
        let summary = stored.result_summary().unwrap();
        assert!((3..=4).contains(&summary.chunks_created));
        assert_eq!(h.index.count().await.unwrap(), summary.chunks_created);

        let assembler = RetrievalAssembler::new(h.client.clone(), h.index.clone(), Duration::from_secs(5));
        let hits = assembler
            .retrieve("chunks embedded in batches", 2)
            .await
            .unwrap();
        assert!(hits.len() <= 2);
        for chunk in hits.chunks() {
            assert_eq!(chunk.source_document_id(), DOC);
            assert!(chunk.character_count() <= 1000);
        }
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let h = harness(FakeEmbeddingProvider::new(32).failing_times(1));
        let mut events = h.processor.subscribe();
        tokio::spawn(h.processor.clone().start());

        let job = job(DOC);
        let job_id = job.id();
        submit(&h, job).await;

        let seen = events_until_done(&mut events).await;
        assert!(seen.iter().any(|e| matches!(e, JobEvent::Retrying { attempt: 1, .. })));
        assert!(matches!(seen.last(), Some(JobEvent::Succeeded { .. })));

        let stored = h.repository.find_by_id(job_id).await.unwrap().unwrap();
        assert_eq!(stored.status(), &JobStatus::Succeeded);
        assert_eq!(stored.attempt_count(), 2);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let h = harness(FakeEmbeddingProvider::new(32));
        let mut events = h.processor.subscribe();
        tokio::spawn(h.processor.clone().start());

        let job = job("mem://missing.txt");
        let job_id = job.id();
        submit(&h, job).await;

        let seen = events_until_done(&mut events).await;
        assert!(!seen.iter().any(|e| matches!(e, JobEvent::Retrying { .. })));

        let stored = h.repository.find_by_id(job_id).await.unwrap().unwrap();
        assert!(stored.status().is_failed());
        assert_eq!(stored.attempt_count(), 1);
        assert!(stored.error_message().is_some());
    }

    #[tokio::test]
    async fn test_recovers_interrupted_jobs() {
        let h = harness(FakeEmbeddingProvider::new(32));

        let queued = job(DOC);
        let mut running = job(DOC);
        running.start().unwrap();
        let mut finished = job(DOC);
        finished.start().unwrap();
        finished.fail("gave up".to_string()).unwrap();

        for j in [&queued, &running, &finished] {
            h.repository.save(j).await.unwrap();
        }

        let recovered = h.processor.recover_pending_jobs().await.unwrap();

        assert_eq!(recovered, 2);
        assert_eq!(h.queue.size().await.unwrap(), 2);
        let reclaimed = h.repository.find_by_id(running.id()).await.unwrap().unwrap();
        assert!(reclaimed.status().is_queued());
        assert_eq!(reclaimed.attempt_count(), 1);
    }

    #[tokio::test]
    async fn test_interrupted_job_without_attempts_left_is_failed() {
        let h = harness(FakeEmbeddingProvider::new(32));
        let mut events = h.processor.subscribe();

        let now = chrono::Utc::now();
        let exhausted = IngestionJob::from_storage(
            uuid::Uuid::new_v4(),
            DOC.to_string(),
            "handbook.txt".to_string(),
            "text/plain".to_string(),
            JobStatus::Running,
            3,
            now,
            Some(now),
            None,
            None,
            None,
        );
        h.repository.save(&exhausted).await.unwrap();

        let recovered = h.processor.recover_pending_jobs().await.unwrap();

        assert_eq!(recovered, 0);
        assert_eq!(h.queue.size().await.unwrap(), 0);
        let stored = h.repository.find_by_id(exhausted.id()).await.unwrap().unwrap();
        assert!(stored.status().is_failed());
        assert_eq!(stored.attempt_count(), 3);
        assert!(matches!(
            events.try_recv(),
            Ok(JobEvent::Failed { attempt: 3, .. })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_delivery_is_processed_once() {
        let h = harness(FakeEmbeddingProvider::new(32));
        let mut events = h.processor.subscribe();

        let job = job(DOC);
        let job_id = job.id();
        h.repository.save(&job).await.unwrap();
        h.queue.enqueue(job.clone()).await.unwrap();
        h.queue.enqueue(job).await.unwrap();

        tokio::spawn(h.processor.clone().start());
        events_until_done(&mut events).await;
        // Let the second delivery drain
        tokio::time::sleep(Duration::from_millis(100)).await;

        let stored = h.repository.find_by_id(job_id).await.unwrap().unwrap();
        assert_eq!(stored.attempt_count(), 1);
        assert!(!matches!(events.try_recv(), Ok(JobEvent::Started { .. })));
    }
}
