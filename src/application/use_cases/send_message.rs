use std::sync::Arc;
use uuid::Uuid;

use tracing::error;

use crate::application::services::{ChatError, ChatResponder};
use crate::domain::entities::ConversationTurn;
use crate::domain::repositories::{ConversationStore, ConversationStoreError};
use crate::domain::value_objects::AuthenticatedUser;

fn storage_failure(error: ConversationStoreError) -> ChatError {
    match error {
        ConversationStoreError::NotFound(id) => ChatError::ConversationNotFound(id),
        other => {
            error!(error = %other, "Conversation storage failed");
            ChatError::Failed
        }
    }
}

#[derive(Debug, Clone)]
pub struct SendMessageResponse {
    pub conversation_id: Uuid,
    pub response: String,
}

pub struct SendMessageUseCase {
    responder: Arc<ChatResponder>,
    conversation_store: Arc<dyn ConversationStore>,
}

impl SendMessageUseCase {
    pub fn new(responder: Arc<ChatResponder>, conversation_store: Arc<dyn ConversationStore>) -> Self {
        Self {
            responder,
            conversation_store,
        }
    }

    /// Continues a conversation the caller owns. The history handed to the
    /// model is read before the new user turn is stored, so the new message
    /// appears exactly once in the prompt.
    pub async fn execute(
        &self,
        user: &AuthenticatedUser,
        conversation_id: Uuid,
        message: &str,
    ) -> Result<SendMessageResponse, ChatError> {
        if message.trim().is_empty() {
            return Err(ChatError::InvalidInput("message is empty".to_string()));
        }

        self.conversation_store
            .find_conversation(conversation_id, user.user_id())
            .await
            .map_err(storage_failure)?
            .ok_or(ChatError::ConversationNotFound(conversation_id))?;

        let history = self
            .conversation_store
            .list_turns(conversation_id)
            .await
            .map_err(storage_failure)?;

        self.conversation_store
            .append_turn(conversation_id, ConversationTurn::user(message))
            .await
            .map_err(storage_failure)?;

        let response = self.responder.respond(message, &history).await?;

        self.conversation_store
            .append_turn(conversation_id, ConversationTurn::assistant(response.clone()))
            .await
            .map_err(storage_failure)?;

        Ok(SendMessageResponse {
            conversation_id,
            response,
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

    async fn seeded_store() -> (Arc<InMemoryConversationStore>, Uuid) {
        let store = Arc::new(InMemoryConversationStore::new());
        let conversation = store
            .create_conversation(
                "Rust",
                "alice",
                vec![
                    ConversationTurn::user("What is ownership?"),
                    ConversationTurn::assistant("Each value has one owner."),
                ],
            )
            .await
            .unwrap();
        (store, conversation.id)
    }

    #[tokio::test]
    async fn test_history_precedes_new_message_once() {
        let generation = Arc::new(FakeGenerationProvider::new().with_reply("References borrow."));
        let (store, id) = seeded_store().await;
        let use_case =
            SendMessageUseCase::new(chat_responder(generation.clone(), &[]).await, store.clone());

        let response = use_case
            .execute(&user("alice"), id, "And borrowing?")
            .await
            .unwrap();
        assert_eq!(response.response, "References borrow.");
        assert_eq!(response.conversation_id, id);

        let prompt = generation.recorded_prompts().pop().unwrap();
        let texts: Vec<&str> = prompt.turns.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["What is ownership?", "Each value has one owner.", "And borrowing?"]
        );

        let turns = store.list_turns(id).await.unwrap();
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[3].text(), "References borrow.");
    }

    #[tokio::test]
    async fn test_other_users_conversation_is_not_found() {
        let generation = Arc::new(FakeGenerationProvider::new());
        let (store, id) = seeded_store().await;
        let use_case =
            SendMessageUseCase::new(chat_responder(generation.clone(), &[]).await, store.clone());

        assert!(matches!(
            use_case.execute(&user("bob"), id, "hi").await,
            Err(ChatError::ConversationNotFound(found)) if found == id
        ));
        assert!(generation.recorded_prompts().is_empty());
        assert_eq!(store.list_turns(id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_conversation() {
        let generation = Arc::new(FakeGenerationProvider::new());
        let (store, _) = seeded_store().await;
        let use_case = SendMessageUseCase::new(chat_responder(generation, &[]).await, store);

        assert!(matches!(
            use_case.execute(&user("alice"), Uuid::new_v4(), "hi").await,
            Err(ChatError::ConversationNotFound(_))
        ));
    }
}
