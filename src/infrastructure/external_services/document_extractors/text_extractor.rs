use async_trait::async_trait;

use crate::application::ports::document_extractor::{
    DocumentExtractionError, DocumentExtractor, ExtractedDocument, ExtractedPage,
};

const FORM_FEED: char = '\u{000C}';

/// Plain text and markdown. A form feed starts a new page.
pub struct TextExtractor;

impl TextExtractor {
    pub fn new() -> Self {
        Self
    }

    fn title_from_text(text: &str) -> Option<String> {
        let first = text.lines().map(str::trim).find(|line| !line.is_empty())?;
        let title = first.trim_start_matches('#').trim();
        if title.is_empty() {
            None
        } else {
            Some(title.chars().take(120).collect())
        }
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentExtractor for TextExtractor {
    async fn extract_from_bytes(
        &self,
        data: &[u8],
        _mime_type: &str,
    ) -> Result<ExtractedDocument, DocumentExtractionError> {
        let text = std::str::from_utf8(data).map_err(|e| {
            DocumentExtractionError::CorruptedFile(format!("Text is not valid UTF-8: {}", e))
        })?;
        let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);

        let pages: Vec<ExtractedPage> = text
            .split(FORM_FEED)
            .enumerate()
            .map(|(i, page)| ExtractedPage {
                page_number: i as u32 + 1,
                text: page.to_string(),
            })
            .collect();

        Ok(ExtractedDocument {
            page_count: pages.len(),
            title: Self::title_from_text(text),
            pages,
        })
    }

    fn supported_formats(&self) -> Vec<String> {
        vec!["text/plain".to_string(), "text/markdown".to_string()]
    }

    fn can_extract(&self, mime_type: &str) -> bool {
        let mime_type = mime_type.to_lowercase();
        self.supported_formats().iter().any(|f| *f == mime_type)
    }

    fn max_file_size(&self) -> Option<usize> {
        Some(20 * 1024 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_form_feed_splits_pages() {
        let extractor = TextExtractor::new();
        let document = extractor
            .extract_from_bytes("# Release notes\nfirst\u{000C}second".as_bytes(), "text/markdown")
            .await
            .unwrap();

        assert_eq!(document.page_count, 2);
        assert_eq!(document.pages[1].page_number, 2);
        assert_eq!(document.pages[1].text, "second");
        assert_eq!(document.title.as_deref(), Some("Release notes"));
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_corrupted() {
        let extractor = TextExtractor::new();
        let result = extractor.extract_from_bytes(&[0xff, 0xfe, 0xfd], "text/plain").await;

        assert!(matches!(result, Err(DocumentExtractionError::CorruptedFile(_))));
    }
}
