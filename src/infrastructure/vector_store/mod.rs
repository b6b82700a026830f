pub mod in_memory_index;
pub mod pgvector_index;
pub mod qdrant_index;

pub use in_memory_index::InMemoryVectorIndex;
pub use pgvector_index::PgVectorIndex;
pub use qdrant_index::QdrantVectorIndex;
