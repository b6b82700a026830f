pub mod conversation_store;
pub mod job_repository;

pub use conversation_store::InMemoryConversationStore;
pub use job_repository::InMemoryJobRepository;
