pub mod indexed_chunk_model;
pub mod job_model;

pub use indexed_chunk_model::*;
pub use job_model::*;
