use std::str::FromStr;
use std::time::Duration;

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} not set", key),
            ConfigError::Invalid { key, message } => write!(f, "Invalid {}: {}", key, message),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorBackend {
    Qdrant,
    PgVector,
    Memory,
}

impl FromStr for VectorBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "qdrant" => Ok(VectorBackend::Qdrant),
            "pgvector" => Ok(VectorBackend::PgVector),
            "memory" => Ok(VectorBackend::Memory),
            other => Err(format!("unknown vector backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_port: u16,

    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub embedding_model: String,
    pub embedding_dimension: usize,
    pub embedding_batch_size: usize,
    pub embedding_timeout: Duration,
    pub generation_model: String,
    pub generation_timeout: Duration,

    pub vector_backend: VectorBackend,
    pub qdrant_url: String,
    pub qdrant_api_key: Option<String>,
    pub vector_collection: String,
    pub vector_timeout: Duration,

    pub database_url: Option<String>,

    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub worker_concurrency: usize,
    pub job_max_attempts: u32,
    pub job_retry_backoff: Duration,
    pub document_fetch_timeout: Duration,
    pub retrieval_top_k: usize,
}

impl AppConfig {
    /// Reads the process environment, after loading `.env` if there is one.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let text = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let optional = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let gemini_api_key = optional("GEMINI_API_KEY").ok_or(ConfigError::Missing("GEMINI_API_KEY"))?;
        let database_url = optional("DATABASE_URL");

        let vector_backend: VectorBackend = parse(&lookup, "VECTOR_BACKEND", VectorBackend::Qdrant)?;
        if vector_backend == VectorBackend::PgVector && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let chunk_size: usize = parse(&lookup, "CHUNK_SIZE", 1000)?;
        let chunk_overlap: usize = parse(&lookup, "CHUNK_OVERLAP", 200)?;
        if chunk_size == 0 {
            return Err(ConfigError::Invalid {
                key: "CHUNK_SIZE",
                message: "must be greater than zero".to_string(),
            });
        }
        if chunk_overlap >= chunk_size {
            return Err(ConfigError::Invalid {
                key: "CHUNK_OVERLAP",
                message: format!("{} must be smaller than CHUNK_SIZE {}", chunk_overlap, chunk_size),
            });
        }

        let embedding_dimension: usize = parse(&lookup, "EMBEDDING_DIMENSION", 768)?;
        if embedding_dimension == 0 {
            return Err(ConfigError::Invalid {
                key: "EMBEDDING_DIMENSION",
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            server_port: parse(&lookup, "SERVER_PORT", 3000)?,
            gemini_api_key,
            gemini_base_url: text("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
            embedding_model: text("EMBEDDING_MODEL", "text-embedding-004"),
            embedding_dimension,
            embedding_batch_size: parse::<usize>(&lookup, "EMBEDDING_BATCH_SIZE", 100)?.max(1),
            embedding_timeout: seconds(&lookup, "EMBEDDING_TIMEOUT_SECS", 30)?,
            generation_model: text("GENERATION_MODEL", "gemini-2.5-flash"),
            generation_timeout: seconds(&lookup, "GENERATION_TIMEOUT_SECS", 60)?,
            vector_backend,
            qdrant_url: text("QDRANT_URL", "http://localhost:6333"),
            qdrant_api_key: optional("QDRANT_API_KEY"),
            vector_collection: text("VECTOR_COLLECTION", "pdf-embeddings"),
            vector_timeout: seconds(&lookup, "VECTOR_TIMEOUT_SECS", 15)?,
            database_url,
            chunk_size,
            chunk_overlap,
            worker_concurrency: parse::<usize>(&lookup, "WORKER_CONCURRENCY", 100)?.max(1),
            job_max_attempts: parse::<u32>(&lookup, "JOB_MAX_ATTEMPTS", 3)?.max(1),
            job_retry_backoff: Duration::from_millis(parse(&lookup, "JOB_RETRY_BACKOFF_MS", 1000)?),
            document_fetch_timeout: seconds(&lookup, "DOCUMENT_FETCH_TIMEOUT_SECS", 60)?,
            retrieval_top_k: parse(&lookup, "RETRIEVAL_TOP_K", 5)?,
        })
    }
}

fn parse<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            message: format!("'{}': {}", raw, e),
        }),
        None => Ok(default),
    }
}

fn seconds(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: u64,
) -> Result<Duration, ConfigError> {
    parse(lookup, key, default).map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("GEMINI_API_KEY", "secret")]).unwrap();

        assert_eq!(config.server_port, 3000);
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 200);
        assert_eq!(config.embedding_dimension, 768);
        assert_eq!(config.vector_backend, VectorBackend::Qdrant);
        assert_eq!(config.vector_collection, "pdf-embeddings");
        assert_eq!(config.worker_concurrency, 100);
        assert_eq!(config.job_max_attempts, 3);
        assert_eq!(config.job_retry_backoff, Duration::from_millis(1000));
        assert_eq!(config.retrieval_top_k, 5);
        assert!(config.database_url.is_none());
        assert!(config.qdrant_api_key.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("GEMINI_API_KEY", "secret"),
            ("SERVER_PORT", "8080"),
            ("VECTOR_BACKEND", "Memory"),
            ("CHUNK_SIZE", "500"),
            ("CHUNK_OVERLAP", "50"),
            ("EMBEDDING_TIMEOUT_SECS", "5"),
            ("QDRANT_API_KEY", "  "),
        ])
        .unwrap();

        assert_eq!(config.server_port, 8080);
        assert_eq!(config.vector_backend, VectorBackend::Memory);
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.chunk_overlap, 50);
        assert_eq!(config.embedding_timeout, Duration::from_secs(5));
        assert!(config.qdrant_api_key.is_none());
    }

    #[test]
    fn test_missing_api_key() {
        assert!(matches!(
            config_from(&[]),
            Err(ConfigError::Missing("GEMINI_API_KEY"))
        ));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            config_from(&[("GEMINI_API_KEY", "k"), ("CHUNK_SIZE", "abc")]),
            Err(ConfigError::Invalid { key: "CHUNK_SIZE", .. })
        ));
        assert!(matches!(
            config_from(&[("GEMINI_API_KEY", "k"), ("CHUNK_OVERLAP", "1000")]),
            Err(ConfigError::Invalid { key: "CHUNK_OVERLAP", .. })
        ));
        assert!(matches!(
            config_from(&[("GEMINI_API_KEY", "k"), ("VECTOR_BACKEND", "faiss")]),
            Err(ConfigError::Invalid { key: "VECTOR_BACKEND", .. })
        ));
    }

    #[test]
    fn test_pgvector_requires_database() {
        assert!(matches!(
            config_from(&[("GEMINI_API_KEY", "k"), ("VECTOR_BACKEND", "pgvector")]),
            Err(ConfigError::Missing("DATABASE_URL"))
        ));
        assert!(
            config_from(&[
                ("GEMINI_API_KEY", "k"),
                ("VECTOR_BACKEND", "pgvector"),
                ("DATABASE_URL", "postgres://localhost/docrag"),
            ])
            .is_ok()
        );
    }
}
