use std::sync::Arc;
use uuid::Uuid;

use tracing::{error, info};

use crate::application::services::{ChatError, ChatResponder};
use crate::domain::entities::ConversationTurn;
use crate::domain::repositories::ConversationStore;
use crate::domain::value_objects::AuthenticatedUser;

#[derive(Debug, Clone)]
pub struct StartConversationResponse {
    pub conversation_id: Uuid,
    pub title: String,
    pub response: String,
}

pub struct StartConversationUseCase {
    responder: Arc<ChatResponder>,
    conversation_store: Arc<dyn ConversationStore>,
}

impl StartConversationUseCase {
    pub fn new(responder: Arc<ChatResponder>, conversation_store: Arc<dyn ConversationStore>) -> Self {
        Self {
            responder,
            conversation_store,
        }
    }

    /// Answers the opening message and names the conversation concurrently,
    /// then stores the conversation with both turns.
    pub async fn execute(
        &self,
        user: &AuthenticatedUser,
        message: &str,
    ) -> Result<StartConversationResponse, ChatError> {
        if message.trim().is_empty() {
            return Err(ChatError::InvalidInput("message is empty".to_string()));
        }

        let (answer, title) = tokio::join!(
            self.responder.respond(message, &[]),
            self.responder.composer().title_for(message)
        );
        let answer = answer?;

        let conversation = self
            .conversation_store
            .create_conversation(
                &title,
                user.user_id(),
                vec![
                    ConversationTurn::user(message),
                    ConversationTurn::assistant(answer.clone()),
                ],
            )
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to store new conversation");
                ChatError::Failed
            })?;

        info!(conversation_id = %conversation.id, title = %conversation.title, "Started conversation");

        Ok(StartConversationResponse {
            conversation_id: conversation.id,
            title: conversation.title,
            response: answer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory::InMemoryConversationStore;
    use crate::test_support::{FakeGenerationProvider, chat_responder};

    fn user(id: &str) -> AuthenticatedUser {
        AuthenticatedUser::new(id.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_stores_conversation_with_both_turns() {
        let generation = Arc::new(
            FakeGenerationProvider::new()
                .with_reply("Ownership moves values.")
                .replying_to("naming a chat conversation", "Rust Ownership"),
        );
        let store = Arc::new(InMemoryConversationStore::new());
        let use_case = StartConversationUseCase::new(
            chat_responder(generation, &["ownership moves values between bindings"]).await,
            store.clone(),
        );

        let response = use_case
            .execute(&user("alice"), "How does ownership work?")
            .await
            .unwrap();

        assert_eq!(response.title, "Rust Ownership");
        assert_eq!(response.response, "Ownership moves values.");

        let conversation = store
            .find_conversation(response.conversation_id, "alice")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(conversation.title, "Rust Ownership");

        let turns = store.list_turns(response.conversation_id).await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].text(), "How does ownership work?");
        assert_eq!(turns[1].text(), "Ownership moves values.");
    }

    #[tokio::test]
    async fn test_failed_answer_stores_nothing() {
        let generation = Arc::new(FakeGenerationProvider::new().failing());
        let use_case = StartConversationUseCase::new(
            chat_responder(generation, &[]).await,
            Arc::new(InMemoryConversationStore::new()),
        );

        assert!(matches!(
            use_case.execute(&user("alice"), "hello").await,
            Err(ChatError::Failed)
        ));
    }

    #[tokio::test]
    async fn test_rejects_blank_message() {
        let generation = Arc::new(FakeGenerationProvider::new());
        let use_case = StartConversationUseCase::new(
            chat_responder(generation.clone(), &[]).await,
            Arc::new(InMemoryConversationStore::new()),
        );

        assert!(matches!(
            use_case.execute(&user("alice"), "   ").await,
            Err(ChatError::InvalidInput(_))
        ));
        assert!(generation.recorded_prompts().is_empty());
    }
}
