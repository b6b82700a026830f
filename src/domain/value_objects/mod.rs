pub mod authenticated_user;
pub mod chunk_id;
pub mod chunk_metadata;
pub mod embedding_vector;
pub mod job_status;

pub use authenticated_user::AuthenticatedUser;
pub use chunk_id::ChunkId;
pub use chunk_metadata::ChunkMetadata;
pub use embedding_vector::EmbeddingVector;
pub use job_status::JobStatus;
