use async_trait::async_trait;

#[derive(Debug)]
pub enum DocumentSourceError {
    NotFound(String),
    InvalidLocator(String),
    NetworkError(String),
    IoError(String),
}

impl DocumentSourceError {
    pub fn is_transient(&self) -> bool {
        matches!(self, DocumentSourceError::NetworkError(_))
    }
}

impl std::fmt::Display for DocumentSourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentSourceError::NotFound(locator) => write!(f, "Document not found: {}", locator),
            DocumentSourceError::InvalidLocator(msg) => write!(f, "Invalid locator: {}", msg),
            DocumentSourceError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            DocumentSourceError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for DocumentSourceError {}

/// Resolves the opaque locator handed over at upload time into raw bytes.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch(&self, locator: &str) -> Result<Vec<u8>, DocumentSourceError>;
}
