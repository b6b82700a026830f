pub mod document_extractor;
pub mod document_source;
pub mod embedding_provider;
pub mod generation_provider;
pub mod job_queue;
pub mod vector_index;

pub use document_extractor::DocumentExtractor;
pub use document_source::DocumentSource;
pub use embedding_provider::EmbeddingProvider;
pub use generation_provider::GenerationProvider;
pub use job_queue::JobQueue;
pub use vector_index::VectorIndex;
