use serde::{Deserialize, Serialize};

use crate::domain::value_objects::ChunkMetadata;

/// A bounded, contiguous segment of a document's text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    text: String,
    sequence_index: usize,
    source_document_id: String,
    metadata: ChunkMetadata,
    // Character offsets of the source region within its page
    start_offset: usize,
    end_offset: usize,
}

impl Chunk {
    pub fn new(
        source_document_id: String,
        text: String,
        sequence_index: usize,
        metadata: ChunkMetadata,
        start_offset: usize,
        end_offset: usize,
    ) -> Self {
        Self {
            text,
            sequence_index,
            source_document_id,
            metadata,
            start_offset,
            end_offset,
        }
    }

    // Getters
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sequence_index(&self) -> usize {
        self.sequence_index
    }

    pub fn source_document_id(&self) -> &str {
        &self.source_document_id
    }

    pub fn metadata(&self) -> &ChunkMetadata {
        &self.metadata
    }

    pub fn start_offset(&self) -> usize {
        self.start_offset
    }

    pub fn end_offset(&self) -> usize {
        self.end_offset
    }

    // Business logic methods
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn character_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    pub fn belongs_to_document(&self, document_id: &str) -> bool {
        self.source_document_id == document_id
    }
}
