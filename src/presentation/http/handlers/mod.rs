pub mod chat_handler;
pub mod health_handler;
pub mod job_handler;

pub use chat_handler::ChatHandler;
pub use health_handler::HealthHandler;
pub use job_handler::JobHandler;
