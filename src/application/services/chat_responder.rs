use std::sync::Arc;

use tracing::{debug, error};

use crate::application::services::conversation_composer::ConversationComposer;
use crate::application::services::retrieval_assembler::{RetrievalAssembler, RetrievalError};
use crate::domain::entities::ConversationTurn;

#[derive(Debug)]
pub enum ChatError {
    InvalidInput(String),
    ConversationNotFound(uuid::Uuid),
    /// Anything the caller cannot act on. Details are logged, not returned.
    Failed,
}

impl std::fmt::Display for ChatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            ChatError::ConversationNotFound(id) => write!(f, "Conversation not found: {}", id),
            ChatError::Failed => write!(f, "Failed to generate a response"),
        }
    }
}

impl std::error::Error for ChatError {}

/// Retrieve, render, compose, generate. Shared by every chat entry point.
pub struct ChatResponder {
    retrieval_assembler: Arc<RetrievalAssembler>,
    composer: Arc<ConversationComposer>,
    top_k: usize,
}

impl ChatResponder {
    pub fn new(
        retrieval_assembler: Arc<RetrievalAssembler>,
        composer: Arc<ConversationComposer>,
        top_k: usize,
    ) -> Self {
        Self {
            retrieval_assembler,
            composer,
            top_k,
        }
    }

    pub fn composer(&self) -> &ConversationComposer {
        &self.composer
    }

    pub async fn respond(
        &self,
        user_message: &str,
        history: &[ConversationTurn],
    ) -> Result<String, ChatError> {
        if user_message.trim().is_empty() {
            return Err(ChatError::InvalidInput("message is empty".to_string()));
        }

        let retrieved = self
            .retrieval_assembler
            .retrieve(user_message, self.top_k)
            .await
            .map_err(|e| match e {
                RetrievalError::InvalidInput(msg) => ChatError::InvalidInput(msg),
                other => {
                    error!(error = %other, "Retrieval failed");
                    ChatError::Failed
                }
            })?;

        debug!(chunks = retrieved.len(), history = history.len(), "Composing prompt");
        let context = RetrievalAssembler::render_context(&retrieved);
        let prompt = ConversationComposer::compose(user_message, &context, history);

        self.composer.generate_answer(prompt).await.map_err(|e| {
            error!(error = %e, "Answer generation failed");
            ChatError::Failed
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeGenerationProvider, chat_responder};

    #[tokio::test]
    async fn test_answer_is_grounded_in_retrieved_chunks() {
        let generation = Arc::new(FakeGenerationProvider::new().with_reply("Borrowing is covered."));
        let responder = chat_responder(
            generation.clone(),
            &["chapter two covers borrowing", "gardening in spring"],
        )
        .await;

        let history = vec![
            ConversationTurn::user("What is chapter one about?"),
            ConversationTurn::assistant("Ownership."),
        ];
        let answer = responder.respond("what does chapter two cover", &history).await.unwrap();

        assert_eq!(answer, "Borrowing is covered.");
        let prompts = generation.recorded_prompts();
        assert_eq!(prompts.len(), 1);
        let instruction = prompts[0].system_instruction.as_deref().unwrap();
        assert!(instruction.contains("chapter two covers borrowing"));
        assert_eq!(prompts[0].turns.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_index_still_answers() {
        let generation = Arc::new(FakeGenerationProvider::new());
        let responder = chat_responder(generation.clone(), &[]).await;

        let answer = responder.respond("hello there", &[]).await.unwrap();

        assert!(!answer.is_empty());
        let instruction = generation.recorded_prompts()[0].system_instruction.clone().unwrap();
        assert!(instruction.contains("No relevant context"));
    }

    #[tokio::test]
    async fn test_rejects_blank_message() {
        let generation = Arc::new(FakeGenerationProvider::new());
        let responder = chat_responder(generation.clone(), &["anything"]).await;

        assert!(matches!(
            responder.respond("  ", &[]).await,
            Err(ChatError::InvalidInput(_))
        ));
        assert!(generation.recorded_prompts().is_empty());
    }

    #[tokio::test]
    async fn test_generation_failure_is_opaque() {
        let generation = Arc::new(FakeGenerationProvider::new().failing());
        let responder = chat_responder(generation, &["anything"]).await;

        assert!(matches!(
            responder.respond("question", &[]).await,
            Err(ChatError::Failed)
        ));
    }
}
