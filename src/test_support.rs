use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::document_source::{DocumentSource, DocumentSourceError};
use crate::application::ports::embedding_provider::{
    BatchEmbeddingRequest, BatchEmbeddingResponse, EmbeddingProvider, EmbeddingProviderError,
};
use crate::application::ports::generation_provider::{
    GenerationProvider, GenerationProviderError, GenerationRequest, GenerationResponse,
};
use crate::application::ports::vector_index::VectorIndex;
use crate::application::services::{
    ChatResponder, ConversationComposer, EmbeddingClient, RetrievalAssembler,
};
use crate::domain::entities::{Chunk, IndexedChunk, Prompt};
use crate::domain::value_objects::{ChunkMetadata, EmbeddingVector};
use crate::infrastructure::vector_store::InMemoryVectorIndex;

const SAMPLE_SENTENCES: [&str; 4] = [
    "The ingestion pipeline fetches each document and extracts its text page by page.",
    "Every page is split into overlapping chunks so that nearby sentences share context.",
    "Chunks are embedded in batches and written to the vector index with their metadata.",
    "At question time the closest chunks are retrieved and handed to the language model.",
];

/// Plain prose of exactly `chars` characters, sentences separated by spaces.
pub fn sample_document(chars: usize) -> String {
    let mut text = String::new();
    let mut i = 0;
    while text.chars().count() < chars {
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(SAMPLE_SENTENCES[i % SAMPLE_SENTENCES.len()]);
        i += 1;
    }
    text.chars().take(chars).collect()
}

/// Deterministic bag-of-words embeddings: each word is hashed into one of
/// `dimension` buckets. Texts sharing words land close together.
pub struct FakeEmbeddingProvider {
    dimension: usize,
    reported_dimension: usize,
    succeed_first: usize,
    fail_next: usize,
    calls: AtomicUsize,
}

impl FakeEmbeddingProvider {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            reported_dimension: dimension,
            succeed_first: 0,
            fail_next: 0,
            calls: AtomicUsize::new(0),
        }
    }

    /// The first `times` calls fail with a transient error.
    pub fn failing_times(self, times: usize) -> Self {
        self.failing_after(0, times)
    }

    /// `ok` calls succeed, the following `fail` calls fail, then it recovers.
    pub fn failing_after(mut self, ok: usize, fail: usize) -> Self {
        self.succeed_first = ok;
        self.fail_next = fail;
        self
    }

    pub fn reporting_dimension(mut self, dimension: usize) -> Self {
        self.reported_dimension = dimension;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn vector_for(&self, text: &str) -> EmbeddingVector {
        let mut values = vec![0.0f32; self.dimension];
        let lowered = text.to_lowercase();
        for word in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let digest = Sha256::digest(word.as_bytes());
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bytes) % self.dimension as u64) as usize;
            values[bucket] += 1.0;
        }
        if values.iter().all(|v| *v == 0.0) {
            values[0] = 1.0;
        }
        EmbeddingVector::new(values)
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbeddingProvider {
    async fn generate_embeddings(
        &self,
        request: BatchEmbeddingRequest,
    ) -> Result<BatchEmbeddingResponse, EmbeddingProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call >= self.succeed_first && call < self.succeed_first + self.fail_next {
            return Err(EmbeddingProviderError::ServiceUnavailable(
                "fake provider outage".to_string(),
            ));
        }

        Ok(BatchEmbeddingResponse {
            embeddings: request.texts.iter().map(|t| self.vector_for(t)).collect(),
            model_name: "fake-embedding".to_string(),
        })
    }

    fn model_info(&self) -> (String, Option<String>) {
        ("fake-embedding".to_string(), None)
    }

    fn embedding_dimension(&self) -> usize {
        self.reported_dimension
    }
}

enum Reply {
    Fixed(String),
    Failing,
}

pub struct FakeGenerationProvider {
    reply: Reply,
    keyed: Vec<(String, String)>,
    prompts: Mutex<Vec<Prompt>>,
}

impl FakeGenerationProvider {
    pub fn new() -> Self {
        Self {
            reply: Reply::Fixed("Here is what the documents say.".to_string()),
            keyed: Vec::new(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_reply(mut self, reply: &str) -> Self {
        self.reply = Reply::Fixed(reply.to_string());
        self
    }

    /// Answers with `reply` whenever the last turn contains `marker`.
    pub fn replying_to(mut self, marker: &str, reply: &str) -> Self {
        self.keyed.push((marker.to_string(), reply.to_string()));
        self
    }

    pub fn failing(mut self) -> Self {
        self.reply = Reply::Failing;
        self
    }

    pub fn recorded_prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl GenerationProvider for FakeGenerationProvider {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationProviderError> {
        let last = request
            .prompt
            .last_turn()
            .map(|turn| turn.text.clone())
            .unwrap_or_default();
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(request.prompt);
        }

        let keyed = self
            .keyed
            .iter()
            .find(|(marker, _)| last.contains(marker.as_str()))
            .map(|(_, reply)| reply.clone());

        let text = match (keyed, &self.reply) {
            (Some(reply), _) => reply,
            (None, Reply::Fixed(reply)) => reply.clone(),
            (None, Reply::Failing) => {
                return Err(GenerationProviderError::ServiceUnavailable(
                    "fake provider outage".to_string(),
                ));
            }
        };

        Ok(GenerationResponse {
            text,
            model_name: "fake-generation".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        "fake-generation"
    }
}

#[derive(Default)]
pub struct StaticDocumentSource {
    documents: HashMap<String, Vec<u8>>,
}

impl StaticDocumentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, locator: &str, text: impl Into<String>) -> Self {
        self.documents
            .insert(locator.to_string(), text.into().into_bytes());
        self
    }
}

#[async_trait]
impl DocumentSource for StaticDocumentSource {
    async fn fetch(&self, locator: &str) -> Result<Vec<u8>, DocumentSourceError> {
        self.documents
            .get(locator)
            .cloned()
            .ok_or_else(|| DocumentSourceError::NotFound(locator.to_string()))
    }
}

/// A responder over an in-memory index holding one chunk per entry of
/// `texts`, answering through `generation`.
pub async fn chat_responder(
    generation: Arc<FakeGenerationProvider>,
    texts: &[&str],
) -> Arc<ChatResponder> {
    let embeddings = Arc::new(FakeEmbeddingProvider::new(32));
    let index = Arc::new(InMemoryVectorIndex::new("chat-test"));
    if !texts.is_empty() {
        let items: Vec<IndexedChunk> = texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let chunk = Chunk::new(
                    "doc-1".to_string(),
                    text.to_string(),
                    i,
                    ChunkMetadata::new(),
                    0,
                    text.chars().count(),
                );
                IndexedChunk::new(chunk, embeddings.vector_for(text))
            })
            .collect();
        index.ensure_collection(32).await.unwrap();
        index.upsert(&items).await.unwrap();
    }

    let client = Arc::new(EmbeddingClient::new(embeddings, 10, Duration::from_secs(5)));
    let assembler = Arc::new(RetrievalAssembler::new(client, index, Duration::from_secs(5)));
    let composer = Arc::new(ConversationComposer::new(generation, Duration::from_secs(5)));
    Arc::new(ChatResponder::new(assembler, composer, 3))
}
