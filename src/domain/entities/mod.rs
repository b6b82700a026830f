pub mod content_chunk;
pub mod conversation;
pub mod indexed_chunk;
pub mod ingestion_job;
pub mod prompt;
pub mod retrieval_result;

pub use content_chunk::Chunk;
pub use conversation::{Conversation, ConversationSummary, ConversationTurn, TurnRole};
pub use indexed_chunk::IndexedChunk;
pub use ingestion_job::{IngestionJob, JobPayload, JobResult};
pub use prompt::{Prompt, PromptTurn};
pub use retrieval_result::{RetrievalResult, ScoredChunk};
