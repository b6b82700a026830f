pub mod postgres_job_repository;

pub use postgres_job_repository::PostgresJobRepository;
