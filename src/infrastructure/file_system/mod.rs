pub mod document_source;

pub use document_source::LocatorDocumentSource;
