use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::{Conversation, ConversationSummary, ConversationTurn};

#[derive(Debug)]
pub enum ConversationStoreError {
    NotFound(Uuid),
    StorageError(String),
}

impl std::fmt::Display for ConversationStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConversationStoreError::NotFound(id) => write!(f, "Conversation not found: {}", id),
            ConversationStoreError::StorageError(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for ConversationStoreError {}

/// Conversation persistence. Lookups are always scoped to the owner, so a
/// conversation owned by someone else is indistinguishable from a missing one.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn create_conversation(
        &self,
        title: &str,
        owner_id: &str,
        initial_turns: Vec<ConversationTurn>,
    ) -> Result<Conversation, ConversationStoreError>;

    async fn find_conversation(
        &self,
        conversation_id: Uuid,
        owner_id: &str,
    ) -> Result<Option<Conversation>, ConversationStoreError>;

    /// The owner's conversations, most recently updated first.
    async fn list_conversations(
        &self,
        owner_id: &str,
    ) -> Result<Vec<ConversationSummary>, ConversationStoreError>;

    async fn append_turn(
        &self,
        conversation_id: Uuid,
        turn: ConversationTurn,
    ) -> Result<(), ConversationStoreError>;

    /// Turns in chronological order.
    async fn list_turns(
        &self,
        conversation_id: Uuid,
    ) -> Result<Vec<ConversationTurn>, ConversationStoreError>;
}
