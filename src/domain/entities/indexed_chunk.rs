use serde::{Deserialize, Serialize};

use crate::domain::entities::Chunk;
use crate::domain::value_objects::{ChunkId, EmbeddingVector};

/// A chunk persisted in the vector index together with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedChunk {
    id: ChunkId,
    chunk: Chunk,
    embedding: EmbeddingVector,
}

impl IndexedChunk {
    /// Builds an indexed chunk whose identifier is derived from the chunk's
    /// source document and position.
    pub fn new(chunk: Chunk, embedding: EmbeddingVector) -> Self {
        let id = ChunkId::derive(chunk.source_document_id(), chunk.sequence_index());
        Self {
            id,
            chunk,
            embedding,
        }
    }

    /// Rebuilds an indexed chunk read back from storage.
    pub fn from_storage(id: ChunkId, chunk: Chunk, embedding: EmbeddingVector) -> Self {
        Self {
            id,
            chunk,
            embedding,
        }
    }

    pub fn id(&self) -> ChunkId {
        self.id
    }

    pub fn chunk(&self) -> &Chunk {
        &self.chunk
    }

    pub fn embedding(&self) -> &EmbeddingVector {
        &self.embedding
    }

    pub fn dimension(&self) -> usize {
        self.embedding.dimension()
    }

    pub fn into_chunk(self) -> Chunk {
        self.chunk
    }
}
