use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::{Conversation, ConversationSummary, ConversationTurn};
use crate::domain::repositories::{ConversationStore, ConversationStoreError};

struct StoredConversation {
    header: Conversation,
    turns: Vec<ConversationTurn>,
}

/// Conversation store for local runs and tests. Production deployments plug
/// in the persistence service that owns conversations.
#[derive(Default)]
pub struct InMemoryConversationStore {
    conversations: RwLock<HashMap<Uuid, StoredConversation>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn create_conversation(
        &self,
        title: &str,
        owner_id: &str,
        initial_turns: Vec<ConversationTurn>,
    ) -> Result<Conversation, ConversationStoreError> {
        let now = Utc::now();
        let header = Conversation {
            id: Uuid::new_v4(),
            title: title.to_string(),
            owner_id: owner_id.to_string(),
            created_at: now,
            updated_at: now,
        };

        self.conversations.write().await.insert(
            header.id,
            StoredConversation {
                header: header.clone(),
                turns: initial_turns,
            },
        );

        Ok(header)
    }

    async fn find_conversation(
        &self,
        conversation_id: Uuid,
        owner_id: &str,
    ) -> Result<Option<Conversation>, ConversationStoreError> {
        let conversations = self.conversations.read().await;
        Ok(conversations
            .get(&conversation_id)
            .map(|stored| &stored.header)
            .filter(|header| header.is_owned_by(owner_id))
            .cloned())
    }

    async fn list_conversations(
        &self,
        owner_id: &str,
    ) -> Result<Vec<ConversationSummary>, ConversationStoreError> {
        let conversations = self.conversations.read().await;
        let mut summaries: Vec<ConversationSummary> = conversations
            .values()
            .filter(|stored| stored.header.is_owned_by(owner_id))
            .map(|stored| ConversationSummary {
                conversation: stored.header.clone(),
                last_message: stored
                    .turns
                    .last()
                    .map(|turn| turn.text().to_string())
                    .unwrap_or_default(),
            })
            .collect();

        summaries.sort_by(|a, b| {
            b.conversation
                .updated_at
                .cmp(&a.conversation.updated_at)
                .then_with(|| b.conversation.created_at.cmp(&a.conversation.created_at))
        });
        Ok(summaries)
    }

    async fn append_turn(
        &self,
        conversation_id: Uuid,
        turn: ConversationTurn,
    ) -> Result<(), ConversationStoreError> {
        let mut conversations = self.conversations.write().await;
        let stored = conversations
            .get_mut(&conversation_id)
            .ok_or(ConversationStoreError::NotFound(conversation_id))?;

        stored.header.updated_at = turn.timestamp();
        stored.turns.push(turn);
        Ok(())
    }

    async fn list_turns(
        &self,
        conversation_id: Uuid,
    ) -> Result<Vec<ConversationTurn>, ConversationStoreError> {
        let conversations = self.conversations.read().await;
        conversations
            .get(&conversation_id)
            .map(|stored| stored.turns.clone())
            .ok_or(ConversationStoreError::NotFound(conversation_id))
    }
}
