use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_builder::{QueryFragment, QueryId};
use diesel::upsert::excluded;
use pgvector::{Vector, VectorExpressionMethods};
use tracing::{debug, info};

use crate::application::ports::vector_index::{VectorIndex, VectorIndexError};
use crate::domain::entities::{IndexedChunk, RetrievalResult, ScoredChunk};
use crate::domain::value_objects::EmbeddingVector;
use crate::infrastructure::database::models::{
    IndexedChunkModel, NewIndexedChunkModel, NewVectorCollectionModel, VectorCollectionModel,
};
use crate::infrastructure::database::schema::{indexed_chunks, vector_collections};
use crate::infrastructure::database::{DbPool, connection::DbConnection, get_connection_from_pool};

/// Vector index stored in Postgres through the pgvector extension. Several
/// named collections can share the `indexed_chunks` table.
pub struct PgVectorIndex {
    pool: DbPool,
    collection: String,
}

impl PgVectorIndex {
    pub fn new(pool: DbPool, collection: impl Into<String>) -> Self {
        Self {
            pool,
            collection: collection.into(),
        }
    }

    fn get_connection(&self) -> Result<DbConnection, VectorIndexError> {
        get_connection_from_pool(&self.pool).map_err(|e| VectorIndexError::BackendError(e.to_string()))
    }

    async fn run<T, F>(&self, operation: F) -> Result<T, VectorIndexError>
    where
        T: Send + 'static,
        F: FnOnce(&mut DbConnection, &str) -> Result<T, VectorIndexError> + Send + 'static,
    {
        let mut conn = self.get_connection()?;
        let collection = self.collection.clone();

        tokio::task::spawn_blocking(move || operation(&mut conn, &collection))
            .await
            .map_err(|e| VectorIndexError::BackendError(format!("Task join error: {}", e)))?
    }
}

fn database_error(error: diesel::result::Error) -> VectorIndexError {
    VectorIndexError::BackendError(error.to_string())
}

/// Insert-or-replace keyed on `(collection_name, id)`, so an id reused by
/// another collection never moves rows between collections.
fn upsert_statement(
    rows: &[NewIndexedChunkModel],
) -> impl QueryFragment<Pg> + QueryId + RunQueryDsl<DbConnection> + '_ {
    diesel::insert_into(indexed_chunks::table)
        .values(rows)
        .on_conflict((indexed_chunks::collection_name, indexed_chunks::id))
        .do_update()
        .set((
            indexed_chunks::source_document_id.eq(excluded(indexed_chunks::source_document_id)),
            indexed_chunks::sequence_index.eq(excluded(indexed_chunks::sequence_index)),
            indexed_chunks::chunk_text.eq(excluded(indexed_chunks::chunk_text)),
            indexed_chunks::start_offset.eq(excluded(indexed_chunks::start_offset)),
            indexed_chunks::end_offset.eq(excluded(indexed_chunks::end_offset)),
            indexed_chunks::metadata.eq(excluded(indexed_chunks::metadata)),
            indexed_chunks::embedding.eq(excluded(indexed_chunks::embedding)),
        ))
}

/// Dimension of the named collection, or `IndexUnavailable` when it was never created.
fn collection_dimension(conn: &mut DbConnection, collection: &str) -> Result<usize, VectorIndexError> {
    let found = vector_collections::table
        .filter(vector_collections::name.eq(collection))
        .select(VectorCollectionModel::as_select())
        .first::<VectorCollectionModel>(conn)
        .optional()
        .map_err(database_error)?;

    match found {
        Some(model) => Ok(model.dimension as usize),
        None => Err(VectorIndexError::IndexUnavailable(format!(
            "collection '{}' does not exist",
            collection
        ))),
    }
}

#[async_trait]
impl VectorIndex for PgVectorIndex {
    async fn ensure_collection(&self, dimension: usize) -> Result<(), VectorIndexError> {
        let requested = i32::try_from(dimension)
            .ok()
            .filter(|d| *d > 0)
            .ok_or_else(|| VectorIndexError::InvalidInput(format!("invalid dimension: {}", dimension)))?;

        let created = self
            .run(move |conn, collection| {
                let inserted = diesel::insert_into(vector_collections::table)
                    .values(&NewVectorCollectionModel {
                        name: collection,
                        dimension: requested,
                    })
                    .on_conflict_do_nothing()
                    .execute(conn)
                    .map_err(database_error)?;

                let existing = collection_dimension(conn, collection)?;
                if existing != dimension {
                    return Err(VectorIndexError::DimensionMismatch {
                        expected: existing,
                        actual: dimension,
                    });
                }
                Ok(inserted > 0)
            })
            .await?;

        if created {
            info!(collection = %self.collection, dimension, "Created vector collection");
        }
        Ok(())
    }

    async fn upsert(&self, items: &[IndexedChunk]) -> Result<(), VectorIndexError> {
        let dimensions: Vec<usize> = items.iter().map(IndexedChunk::dimension).collect();
        let rows = items
            .iter()
            .map(|item| NewIndexedChunkModel::from_domain(&self.collection, item))
            .collect::<Result<Vec<_>, _>>()
            .map_err(VectorIndexError::InvalidInput)?;
        let count = rows.len();

        self.run(move |conn, collection| {
            let expected = collection_dimension(conn, collection)?;
            if let Some(actual) = dimensions.into_iter().find(|d| *d != expected) {
                return Err(VectorIndexError::DimensionMismatch { expected, actual });
            }
            if rows.is_empty() {
                return Ok(());
            }

            conn.transaction(|conn| upsert_statement(&rows).execute(conn).map(|_| ()))
                .map_err(database_error)
        })
        .await?;

        debug!(collection = %self.collection, rows = count, "Upserted chunks");
        Ok(())
    }

    async fn search(
        &self,
        query: &EmbeddingVector,
        k: usize,
    ) -> Result<RetrievalResult, VectorIndexError> {
        if k == 0 {
            return Ok(RetrievalResult::empty());
        }

        let query_dimension = query.dimension();
        let query_vector = Vector::from(query.as_slice().to_vec());
        let limit = i64::try_from(k).unwrap_or(i64::MAX);

        let models = self
            .run(move |conn, collection| {
                let expected = collection_dimension(conn, collection)?;
                if expected != query_dimension {
                    return Err(VectorIndexError::DimensionMismatch {
                        expected,
                        actual: query_dimension,
                    });
                }

                indexed_chunks::table
                    .filter(indexed_chunks::collection_name.eq(collection))
                    .order((
                        indexed_chunks::embedding.cosine_distance(query_vector),
                        indexed_chunks::inserted_seq.asc(),
                    ))
                    .limit(limit)
                    .select(IndexedChunkModel::as_select())
                    .load::<IndexedChunkModel>(conn)
                    .map_err(database_error)
            })
            .await?;

        let mut scored = Vec::with_capacity(models.len());
        for model in models {
            let item = IndexedChunk::try_from(model).map_err(VectorIndexError::BackendError)?;
            let similarity_score = query.cosine_similarity(item.embedding());
            scored.push(ScoredChunk {
                chunk: item.into_chunk(),
                similarity_score,
            });
        }

        Ok(RetrievalResult::from_ranked(scored))
    }

    async fn count(&self) -> Result<usize, VectorIndexError> {
        self.run(|conn, collection| {
            collection_dimension(conn, collection)?;
            let total = indexed_chunks::table
                .filter(indexed_chunks::collection_name.eq(collection))
                .count()
                .get_result::<i64>(conn)
                .map_err(database_error)?;
            Ok(total as usize)
        })
        .await
    }

    fn collection_name(&self) -> &str {
        &self.collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Chunk;
    use crate::domain::value_objects::ChunkMetadata;

    #[test]
    fn test_upsert_conflicts_within_collection_only() {
        let chunk = Chunk::new(
            "report.pdf".to_string(),
            "quarterly revenue".to_string(),
            0,
            ChunkMetadata::new(),
            0,
            17,
        );
        let item = IndexedChunk::new(chunk, EmbeddingVector::new(vec![0.5, 0.5]));
        let rows = vec![NewIndexedChunkModel::from_domain("reports", &item).unwrap()];

        let sql = diesel::debug_query::<Pg, _>(&upsert_statement(&rows)).to_string();

        assert!(sql.contains(r#"ON CONFLICT ("collection_name", "id")"#), "{}", sql);
        assert!(!sql.contains(r#""collection_name" = excluded"#), "{}", sql);
        assert!(sql.contains(r#""embedding" = excluded."embedding""#), "{}", sql);
    }
}
