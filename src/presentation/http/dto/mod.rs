pub mod chat_dto;
pub mod job_dto;
pub mod response_dto;

pub use chat_dto::*;
pub use job_dto::*;
pub use response_dto::*;
