use async_trait::async_trait;
use std::sync::Arc;

use super::{PdfExtractor, TextExtractor};
use crate::application::ports::document_extractor::{
    DocumentExtractionError, DocumentExtractor, ExtractedDocument,
};

pub struct CompositeDocumentExtractor {
    pdf_extractor: Arc<PdfExtractor>,
    text_extractor: Arc<TextExtractor>,
}

impl CompositeDocumentExtractor {
    pub fn new() -> Self {
        Self {
            pdf_extractor: Arc::new(PdfExtractor::new()),
            text_extractor: Arc::new(TextExtractor::new()),
        }
    }

    fn get_extractor_for_type(&self, mime_type: &str) -> Option<Arc<dyn DocumentExtractor>> {
        let mime_type_lower = mime_type.to_lowercase();

        if self.pdf_extractor.can_extract(&mime_type_lower) {
            Some(self.pdf_extractor.clone())
        } else if self.text_extractor.can_extract(&mime_type_lower) {
            Some(self.text_extractor.clone())
        } else {
            None
        }
    }
}

impl Default for CompositeDocumentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentExtractor for CompositeDocumentExtractor {
    async fn extract_from_bytes(
        &self,
        data: &[u8],
        mime_type: &str,
    ) -> Result<ExtractedDocument, DocumentExtractionError> {
        let extractor = self
            .get_extractor_for_type(mime_type)
            .ok_or_else(|| DocumentExtractionError::UnsupportedFormat(mime_type.to_string()))?;

        extractor.extract_from_bytes(data, mime_type).await
    }

    fn supported_formats(&self) -> Vec<String> {
        let mut formats = Vec::new();
        formats.extend(self.pdf_extractor.supported_formats());
        formats.extend(self.text_extractor.supported_formats());
        formats
    }

    fn can_extract(&self, mime_type: &str) -> bool {
        self.get_extractor_for_type(mime_type).is_some()
    }

    fn max_file_size(&self) -> Option<usize> {
        [
            self.pdf_extractor.max_file_size(),
            self.text_extractor.max_file_size(),
        ]
        .iter()
        .filter_map(|&size| size)
        .max()
    }
}
