pub mod background_processor;
pub mod job_events;
pub mod mpsc_job_queue;

pub use background_processor::{BackgroundProcessor, RetryPolicy};
pub use job_events::spawn_event_logger;
pub use mpsc_job_queue::{MpscJobQueue, MpscJobQueueReceiver};
