pub mod chat_responder;
pub mod conversation_composer;
pub mod embedding_client;
pub mod ingestion_pipeline;
pub mod retrieval_assembler;
pub mod text_splitter;

pub use chat_responder::{ChatError, ChatResponder};
pub use conversation_composer::ConversationComposer;
pub use embedding_client::EmbeddingClient;
pub use ingestion_pipeline::IngestionPipeline;
pub use retrieval_assembler::RetrievalAssembler;
pub use text_splitter::TextSplitter;
