use chrono::{DateTime, Utc};
use diesel::prelude::*;
use pgvector::Vector;
use uuid::Uuid;

use crate::domain::entities::{Chunk, IndexedChunk};
use crate::domain::value_objects::{ChunkId, ChunkMetadata, EmbeddingVector};
use crate::infrastructure::database::schema::{indexed_chunks, vector_collections};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = vector_collections)]
#[diesel(primary_key(name))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct VectorCollectionModel {
    pub name: String,
    pub dimension: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = vector_collections)]
pub struct NewVectorCollectionModel<'a> {
    pub name: &'a str,
    pub dimension: i32,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = indexed_chunks)]
#[diesel(primary_key(collection_name, id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct IndexedChunkModel {
    pub id: Uuid,
    pub collection_name: String,
    pub source_document_id: String,
    pub sequence_index: i32,
    pub chunk_text: String,
    pub start_offset: i32,
    pub end_offset: i32,
    pub metadata: serde_json::Value,
    pub embedding: Vector,
    pub inserted_seq: i64,
}

/// Insert shape. `inserted_seq` is assigned by the database on first insert
/// and left untouched by upserts.
#[derive(Debug, Insertable)]
#[diesel(table_name = indexed_chunks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewIndexedChunkModel {
    pub id: Uuid,
    pub collection_name: String,
    pub source_document_id: String,
    pub sequence_index: i32,
    pub chunk_text: String,
    pub start_offset: i32,
    pub end_offset: i32,
    pub metadata: serde_json::Value,
    pub embedding: Vector,
}

impl NewIndexedChunkModel {
    pub fn from_domain(collection_name: &str, item: &IndexedChunk) -> Result<Self, String> {
        let chunk = item.chunk();
        let metadata = serde_json::to_value(chunk.metadata())
            .map_err(|e| format!("Failed to serialize chunk metadata: {}", e))?;

        Ok(Self {
            id: item.id().as_uuid(),
            collection_name: collection_name.to_string(),
            source_document_id: chunk.source_document_id().to_string(),
            sequence_index: to_i32(chunk.sequence_index(), "sequence index")?,
            chunk_text: chunk.text().to_string(),
            start_offset: to_i32(chunk.start_offset(), "start offset")?,
            end_offset: to_i32(chunk.end_offset(), "end offset")?,
            metadata,
            embedding: Vector::from(item.embedding().as_slice().to_vec()),
        })
    }
}

impl TryFrom<IndexedChunkModel> for IndexedChunk {
    type Error = String;

    fn try_from(model: IndexedChunkModel) -> Result<Self, Self::Error> {
        let metadata: ChunkMetadata = serde_json::from_value(model.metadata)
            .map_err(|e| format!("Failed to parse chunk metadata: {}", e))?;

        let chunk = Chunk::new(
            model.source_document_id,
            model.chunk_text,
            from_i32(model.sequence_index, "sequence index")?,
            metadata,
            from_i32(model.start_offset, "start offset")?,
            from_i32(model.end_offset, "end offset")?,
        );

        Ok(IndexedChunk::from_storage(
            ChunkId::from_uuid(model.id),
            chunk,
            EmbeddingVector::new(model.embedding.to_vec()),
        ))
    }
}

fn to_i32(value: usize, field: &str) -> Result<i32, String> {
    i32::try_from(value).map_err(|_| format!("{} out of range: {}", field, value))
}

fn from_i32(value: i32, field: &str) -> Result<usize, String> {
    usize::try_from(value).map_err(|_| format!("Invalid {}: {}", field, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::chunk_metadata::{FILENAME_KEY, PAGE_NUMBER_KEY};

    #[test]
    fn test_model_conversion_keeps_identity_and_metadata() {
        let chunk = Chunk::new(
            "https://files.example.com/report.pdf".to_string(),
            "Quarterly revenue grew.".to_string(),
            3,
            ChunkMetadata::new()
                .with_property(FILENAME_KEY, "report.pdf")
                .with_property(PAGE_NUMBER_KEY, "2"),
            1600,
            1623,
        );
        let item = IndexedChunk::new(chunk, EmbeddingVector::new(vec![0.25, 0.5, 0.75]));

        let new_model = NewIndexedChunkModel::from_domain("pdf-embeddings", &item).unwrap();
        let stored = IndexedChunkModel {
            id: new_model.id,
            collection_name: new_model.collection_name,
            source_document_id: new_model.source_document_id,
            sequence_index: new_model.sequence_index,
            chunk_text: new_model.chunk_text,
            start_offset: new_model.start_offset,
            end_offset: new_model.end_offset,
            metadata: new_model.metadata,
            embedding: new_model.embedding,
            inserted_seq: 1,
        };

        let restored = IndexedChunk::try_from(stored).unwrap();
        assert_eq!(restored, item);
        assert_eq!(restored.chunk().metadata().page_number(), Some(2));
    }
}
