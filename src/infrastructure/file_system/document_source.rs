use async_trait::async_trait;
use reqwest::{Client, Error as ReqwestError, StatusCode};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;
use url::Url;

use crate::application::ports::document_source::{DocumentSource, DocumentSourceError};

/// Fetches documents by locator: `http(s)://` over HTTP, `file://` URLs and
/// bare paths from the local filesystem.
pub struct LocatorDocumentSource {
    client: Client,
}

impl LocatorDocumentSource {
    pub fn new(timeout: Duration) -> Result<Self, ReqwestError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    async fn fetch_http(&self, url: Url) -> Result<Vec<u8>, DocumentSourceError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| DocumentSourceError::NetworkError(e.without_url().to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(DocumentSourceError::NotFound(url.to_string()));
        }
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(DocumentSourceError::NetworkError(format!(
                "{} responded with {}",
                url, status
            )));
        }
        if !status.is_success() {
            return Err(DocumentSourceError::InvalidLocator(format!(
                "{} responded with {}",
                url, status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DocumentSourceError::NetworkError(e.without_url().to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn fetch_file(&self, path: PathBuf) -> Result<Vec<u8>, DocumentSourceError> {
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
                DocumentSourceError::NotFound(path.to_string_lossy().to_string()),
            ),
            Err(e) => Err(DocumentSourceError::IoError(e.to_string())),
        }
    }
}

#[async_trait]
impl DocumentSource for LocatorDocumentSource {
    async fn fetch(&self, locator: &str) -> Result<Vec<u8>, DocumentSourceError> {
        let locator = locator.trim();
        if locator.is_empty() {
            return Err(DocumentSourceError::InvalidLocator(
                "locator is empty".to_string(),
            ));
        }

        if !locator.contains("://") {
            return self.fetch_file(PathBuf::from(locator)).await;
        }

        let url = Url::parse(locator)
            .map_err(|e| DocumentSourceError::InvalidLocator(format!("{}: {}", locator, e)))?;

        match url.scheme() {
            "http" | "https" => self.fetch_http(url).await,
            "file" => {
                let path = url.to_file_path().map_err(|_| {
                    DocumentSourceError::InvalidLocator(format!("{} is not a local path", locator))
                })?;
                self.fetch_file(path).await
            }
            other => Err(DocumentSourceError::InvalidLocator(format!(
                "unsupported scheme: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> LocatorDocumentSource {
        LocatorDocumentSource::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_reads_local_paths_and_file_urls() {
        let path = std::env::temp_dir().join(format!("docrag-{}.txt", uuid::Uuid::new_v4()));
        fs::write(&path, b"local document").await.unwrap();

        let bare = source().fetch(path.to_str().unwrap()).await.unwrap();
        assert_eq!(bare, b"local document");

        let file_url = Url::from_file_path(&path).unwrap();
        let via_url = source().fetch(file_url.as_str()).await.unwrap();
        assert_eq!(via_url, b"local document");

        fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let path = std::env::temp_dir().join(format!("docrag-missing-{}.pdf", uuid::Uuid::new_v4()));

        let result = source().fetch(path.to_str().unwrap()).await;
        assert!(matches!(result, Err(DocumentSourceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_rejects_unknown_schemes() {
        let result = source().fetch("ftp://files.example.com/a.pdf").await;
        assert!(matches!(result, Err(DocumentSourceError::InvalidLocator(_))));

        let result = source().fetch("   ").await;
        assert!(matches!(result, Err(DocumentSourceError::InvalidLocator(_))));
    }
}
