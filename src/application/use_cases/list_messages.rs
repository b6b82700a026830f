use std::sync::Arc;
use uuid::Uuid;

use crate::application::services::ChatError;
use crate::domain::entities::{Conversation, ConversationTurn};
use crate::domain::repositories::ConversationStore;
use crate::domain::value_objects::AuthenticatedUser;

pub struct ListMessagesUseCase {
    conversation_store: Arc<dyn ConversationStore>,
}

impl ListMessagesUseCase {
    pub fn new(conversation_store: Arc<dyn ConversationStore>) -> Self {
        Self { conversation_store }
    }

    pub async fn execute(
        &self,
        user: &AuthenticatedUser,
        conversation_id: Uuid,
    ) -> Result<(Conversation, Vec<ConversationTurn>), ChatError> {
        let conversation = self
            .conversation_store
            .find_conversation(conversation_id, user.user_id())
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to load conversation");
                ChatError::Failed
            })?
            .ok_or(ChatError::ConversationNotFound(conversation_id))?;

        let turns = self
            .conversation_store
            .list_turns(conversation_id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to load conversation turns");
                ChatError::Failed
            })?;

        Ok((conversation, turns))
    }
}
