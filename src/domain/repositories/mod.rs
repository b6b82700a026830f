pub mod conversation_repository;
pub mod job_repository;

pub use conversation_repository::{ConversationStore, ConversationStoreError};
pub use job_repository::{JobRepository, JobRepositoryError};
