use async_trait::async_trait;
use lopdf::Document;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::warn;

use crate::application::ports::document_extractor::{
    DocumentExtractionError, DocumentExtractor, ExtractedDocument, ExtractedPage,
};

pub struct PdfExtractor {
    password: String,
}

impl PdfExtractor {
    pub fn new() -> Self {
        Self {
            password: String::new(),
        }
    }

    fn extract_blocking(
        data: Vec<u8>,
        password: String,
    ) -> Result<ExtractedDocument, DocumentExtractionError> {
        let mut doc = Document::load_mem(&data)
            .map_err(|e| DocumentExtractionError::CorruptedFile(e.to_string()))?;

        if doc.is_encrypted() {
            doc.decrypt(&password).map_err(|_e| {
                DocumentExtractionError::ExtractionFailed(
                    "Failed to decrypt PDF - invalid password".to_string(),
                )
            })?;
        }

        let page_numbers: Vec<u32> = doc.get_pages().into_keys().collect();
        let page_count = page_numbers.len();

        let extracted: Vec<Result<ExtractedPage, String>> = page_numbers
            .into_par_iter()
            .map(|page_number| {
                let text = doc.extract_text(&[page_number]).map_err(|e| {
                    format!("Failed to extract text from page {}: {}", page_number, e)
                })?;

                Ok(ExtractedPage {
                    page_number,
                    text: normalize_page_text(&text),
                })
            })
            .collect();

        let mut pages = Vec::with_capacity(page_count);
        let mut failures = 0;
        for result in extracted {
            match result {
                Ok(page) => pages.push(page),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable PDF page");
                    failures += 1;
                }
            }
        }

        if page_count > 0 && failures == page_count {
            return Err(DocumentExtractionError::ExtractionFailed(
                "No page of the PDF could be read".to_string(),
            ));
        }

        Ok(ExtractedDocument {
            pages,
            title: Self::title_from_info(&doc),
            page_count,
        })
    }

    fn title_from_info(doc: &Document) -> Option<String> {
        let info = doc.trailer.get(b"Info").ok()?;
        let info_dict = match info.as_reference() {
            Ok(id) => doc.get_dictionary(id).ok()?,
            Err(_) => info.as_dict().ok()?,
        };
        let title = info_dict.get(b"Title").ok()?.as_str().ok()?;
        let title = std::str::from_utf8(title).ok()?.trim().to_string();

        if title.is_empty() { None } else { Some(title) }
    }
}

/// Trims line ends and collapses runs of blank lines into one, so paragraph
/// breaks survive as `"\n\n"`.
fn normalize_page_text(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in text.lines().map(str::trim_end) {
        if line.is_empty() && lines.last().is_none_or(|last| last.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    while lines.last().is_some_and(|last| last.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentExtractor for PdfExtractor {
    async fn extract_from_bytes(
        &self,
        data: &[u8],
        _mime_type: &str,
    ) -> Result<ExtractedDocument, DocumentExtractionError> {
        let data = data.to_vec();
        let password = self.password.clone();

        // lopdf parsing and the rayon fan-out are CPU bound
        tokio::task::spawn_blocking(move || Self::extract_blocking(data, password))
            .await
            .map_err(|e| DocumentExtractionError::ExtractionFailed(e.to_string()))?
    }

    fn supported_formats(&self) -> Vec<String> {
        vec!["application/pdf".to_string()]
    }

    fn can_extract(&self, mime_type: &str) -> bool {
        mime_type.to_lowercase() == "application/pdf"
    }

    fn max_file_size(&self) -> Option<usize> {
        Some(100 * 1024 * 1024) // 100MB max for PDF files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    fn single_page_pdf(text: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    #[tokio::test]
    async fn test_extracts_page_text() {
        let extractor = PdfExtractor::new();
        let pdf = single_page_pdf("Hello World");

        let document = extractor
            .extract_from_bytes(&pdf, "application/pdf")
            .await
            .unwrap();

        assert_eq!(document.page_count, 1);
        assert_eq!(document.pages[0].page_number, 1);
        assert!(document.pages[0].text.contains("Hello World"));
    }

    #[test]
    fn test_page_text_keeps_paragraph_breaks() {
        let raw = "\n\nIntroduction  \nfirst paragraph\n\n\n   \nsecond paragraph\n\n";

        assert_eq!(
            normalize_page_text(raw),
            "Introduction\nfirst paragraph\n\nsecond paragraph"
        );
        assert_eq!(normalize_page_text(" \n \n"), "");
    }

    #[tokio::test]
    async fn test_rejects_garbage() {
        let extractor = PdfExtractor::new();

        let result = extractor
            .extract_from_bytes(b"definitely not a pdf", "application/pdf")
            .await;

        assert!(matches!(result, Err(DocumentExtractionError::CorruptedFile(_))));
    }

    #[test]
    fn test_can_extract() {
        let extractor = PdfExtractor::new();
        assert!(extractor.can_extract("application/pdf"));
        assert!(extractor.can_extract("Application/PDF"));
        assert!(!extractor.can_extract("text/plain"));
    }
}
