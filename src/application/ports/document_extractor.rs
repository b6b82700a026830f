use async_trait::async_trait;

#[derive(Debug)]
pub enum DocumentExtractionError {
    UnsupportedFormat(String),
    CorruptedFile(String),
    ExtractionFailed(String),
}

impl std::fmt::Display for DocumentExtractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentExtractionError::UnsupportedFormat(format) => {
                write!(f, "Unsupported format: {}", format)
            }
            DocumentExtractionError::CorruptedFile(msg) => write!(f, "Corrupted file: {}", msg),
            DocumentExtractionError::ExtractionFailed(msg) => {
                write!(f, "Extraction failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for DocumentExtractionError {}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPage {
    /// 1-based
    pub page_number: u32,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub pages: Vec<ExtractedPage>,
    pub title: Option<String>,
    pub page_count: usize,
}

impl ExtractedDocument {
    pub fn text_length(&self) -> usize {
        self.pages.iter().map(|p| p.text.chars().count()).sum()
    }
}

#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract_from_bytes(
        &self,
        data: &[u8],
        mime_type: &str,
    ) -> Result<ExtractedDocument, DocumentExtractionError>;

    fn supported_formats(&self) -> Vec<String>;

    fn can_extract(&self, mime_type: &str) -> bool;

    fn max_file_size(&self) -> Option<usize>;
}
