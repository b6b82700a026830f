use std::sync::Arc;

use tracing::info;

use crate::{
    application::{
        ports::{
            DocumentExtractor, DocumentSource, EmbeddingProvider, GenerationProvider, JobQueue,
            VectorIndex,
        },
        services::{
            ChatResponder, ConversationComposer, EmbeddingClient, IngestionPipeline,
            RetrievalAssembler, TextSplitter,
        },
        use_cases::{
            GetJobStatusUseCase, ListConversationsUseCase, ListMessagesUseCase, SendMessageUseCase,
            StartConversationUseCase, SubmitDocumentUseCase,
        },
    },
    domain::repositories::{ConversationStore, JobRepository},
    infrastructure::{
        config::{AppConfig, VectorBackend},
        database::{DbPool, create_connection_pool, repositories::PostgresJobRepository, run_migrations},
        external_services::{
            GeminiClient, GeminiClientConfig, GeminiEmbeddingProvider, GeminiGenerationProvider,
            document_extractors::CompositeDocumentExtractor,
        },
        file_system::LocatorDocumentSource,
        memory::{InMemoryConversationStore, InMemoryJobRepository},
        messaging::{BackgroundProcessor, MpscJobQueue, RetryPolicy},
        vector_store::{InMemoryVectorIndex, PgVectorIndex, QdrantVectorIndex},
    },
    presentation::http::handlers::{ChatHandler, HealthHandler, JobHandler},
};

const DB_POOL_SIZE: u32 = 10;

pub struct AppContainer {
    // Storage
    pub job_repository: Arc<dyn JobRepository>,
    pub conversation_store: Arc<dyn ConversationStore>,
    pub vector_index: Arc<dyn VectorIndex>,

    // External Services
    pub embedding_provider: Arc<dyn EmbeddingProvider>,
    pub generation_provider: Arc<dyn GenerationProvider>,
    pub document_source: Arc<dyn DocumentSource>,
    pub document_extractor: Arc<dyn DocumentExtractor>,

    // Job Queue and Background Processing
    pub job_queue: Arc<dyn JobQueue>,
    pub background_processor: Arc<BackgroundProcessor>,

    // Application Services
    pub ingestion_pipeline: Arc<IngestionPipeline>,
    pub chat_responder: Arc<ChatResponder>,

    // Use Cases
    pub submit_document_use_case: Arc<SubmitDocumentUseCase>,
    pub get_job_status_use_case: Arc<GetJobStatusUseCase>,
    pub start_conversation_use_case: Arc<StartConversationUseCase>,
    pub send_message_use_case: Arc<SendMessageUseCase>,
    pub list_messages_use_case: Arc<ListMessagesUseCase>,
    pub list_conversations_use_case: Arc<ListConversationsUseCase>,

    // HTTP Handlers
    pub health_handler: Arc<HealthHandler>,
    pub job_handler: Arc<JobHandler>,
    pub chat_handler: Arc<ChatHandler>,
}

impl AppContainer {
    pub async fn new(config: &AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        // Postgres is optional unless it also backs the vector index
        let db_pool = match &config.database_url {
            Some(url) => Some(connect_database(url).await?),
            None => None,
        };

        let job_repository: Arc<dyn JobRepository> = match &db_pool {
            Some(pool) => Arc::new(PostgresJobRepository::new(pool.clone())),
            None => {
                info!("DATABASE_URL not set, job records are kept in memory");
                Arc::new(InMemoryJobRepository::new())
            }
        };
        let conversation_store: Arc<dyn ConversationStore> = Arc::new(InMemoryConversationStore::new());

        let vector_index: Arc<dyn VectorIndex> = match config.vector_backend {
            VectorBackend::Qdrant => Arc::new(QdrantVectorIndex::new(
                &config.qdrant_url,
                config.vector_collection.clone(),
                config.qdrant_api_key.as_deref(),
                config.vector_timeout,
            )?),
            VectorBackend::PgVector => {
                let pool = db_pool
                    .clone()
                    .ok_or("VECTOR_BACKEND=pgvector requires DATABASE_URL")?;
                Arc::new(PgVectorIndex::new(pool, config.vector_collection.clone()))
            }
            VectorBackend::Memory => Arc::new(InMemoryVectorIndex::new(config.vector_collection.clone())),
        };
        info!(backend = ?config.vector_backend, collection = %config.vector_collection, "Vector index configured");

        // Create external services
        let mut gemini_config = GeminiClientConfig::new(config.gemini_api_key.clone());
        gemini_config.base_url = config.gemini_base_url.clone();
        gemini_config.timeout_secs = config
            .embedding_timeout
            .max(config.generation_timeout)
            .as_secs()
            .max(1);
        let gemini = GeminiClient::new(gemini_config)
            .map_err(|e| format!("Failed to create Gemini client: {}", e))?;

        let embedding_provider: Arc<dyn EmbeddingProvider> = Arc::new(GeminiEmbeddingProvider::new(
            gemini.clone(),
            config.embedding_model.clone(),
            config.embedding_dimension,
        ));
        let generation_provider: Arc<dyn GenerationProvider> = Arc::new(
            GeminiGenerationProvider::new(gemini, config.generation_model.clone()),
        );

        let document_source: Arc<dyn DocumentSource> = Arc::new(
            LocatorDocumentSource::new(config.document_fetch_timeout)
                .map_err(|e| format!("Failed to create document source: {}", e))?,
        );
        let document_extractor: Arc<dyn DocumentExtractor> = Arc::new(CompositeDocumentExtractor::new());

        // Create application services
        let embedding_client = Arc::new(EmbeddingClient::new(
            embedding_provider.clone(),
            config.embedding_batch_size,
            config.embedding_timeout,
        ));
        let text_splitter = TextSplitter::new(config.chunk_size, config.chunk_overlap)?;

        let ingestion_pipeline = Arc::new(IngestionPipeline::new(
            document_source.clone(),
            document_extractor.clone(),
            embedding_client.clone(),
            vector_index.clone(),
            text_splitter,
            config.vector_timeout,
        ));

        let retrieval_assembler = Arc::new(RetrievalAssembler::new(
            embedding_client,
            vector_index.clone(),
            config.vector_timeout,
        ));
        let composer = Arc::new(ConversationComposer::new(
            generation_provider.clone(),
            config.generation_timeout,
        ));
        let chat_responder = Arc::new(ChatResponder::new(
            retrieval_assembler,
            composer,
            config.retrieval_top_k,
        ));

        // Create job queue and background processor
        let (job_queue, job_receiver) = MpscJobQueue::create_pair();
        let job_queue: Arc<dyn JobQueue> = Arc::new(job_queue);

        let background_processor = Arc::new(
            BackgroundProcessor::new(
                Arc::new(job_receiver),
                job_queue.clone(),
                job_repository.clone(),
                ingestion_pipeline.clone(),
            )
            .with_worker_count(config.worker_concurrency)
            .with_retry_policy(RetryPolicy {
                max_attempts: config.job_max_attempts,
                base_delay: config.job_retry_backoff,
                ..RetryPolicy::default()
            }),
        );

        // Create use cases
        let submit_document_use_case = Arc::new(SubmitDocumentUseCase::new(
            job_repository.clone(),
            job_queue.clone(),
            document_extractor.clone(),
        ));
        let get_job_status_use_case = Arc::new(GetJobStatusUseCase::new(job_repository.clone()));

        let start_conversation_use_case = Arc::new(StartConversationUseCase::new(
            chat_responder.clone(),
            conversation_store.clone(),
        ));
        let send_message_use_case = Arc::new(SendMessageUseCase::new(
            chat_responder.clone(),
            conversation_store.clone(),
        ));
        let list_messages_use_case = Arc::new(ListMessagesUseCase::new(conversation_store.clone()));
        let list_conversations_use_case =
            Arc::new(ListConversationsUseCase::new(conversation_store.clone()));

        // Create HTTP handlers
        let health_handler = Arc::new(HealthHandler::new(job_queue.clone(), job_repository.clone()));
        let job_handler = Arc::new(JobHandler::new(
            submit_document_use_case.clone(),
            get_job_status_use_case.clone(),
        ));
        let chat_handler = Arc::new(ChatHandler::new(
            start_conversation_use_case.clone(),
            send_message_use_case.clone(),
            list_messages_use_case.clone(),
            list_conversations_use_case.clone(),
        ));

        Ok(Self {
            job_repository,
            conversation_store,
            vector_index,
            embedding_provider,
            generation_provider,
            document_source,
            document_extractor,
            job_queue,
            background_processor,
            ingestion_pipeline,
            chat_responder,
            submit_document_use_case,
            get_job_status_use_case,
            start_conversation_use_case,
            send_message_use_case,
            list_messages_use_case,
            list_conversations_use_case,
            health_handler,
            job_handler,
            chat_handler,
        })
    }
}

async fn connect_database(url: &str) -> Result<DbPool, Box<dyn std::error::Error>> {
    let migration_url = url.to_string();
    let applied = tokio::task::spawn_blocking(move || run_migrations(&migration_url))
        .await
        .map_err(|e| format!("Migration task failed: {}", e))?
        .map_err(|e| format!("Failed to run database migrations: {}", e))?;
    info!(applied, "Database migrations up to date");

    let url = url.to_string();
    let pool = tokio::task::spawn_blocking(move || create_connection_pool(&url, DB_POOL_SIZE))
        .await
        .map_err(|e| format!("Connection pool task failed: {}", e))??;
    Ok(pool)
}
