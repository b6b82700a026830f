use std::sync::Arc;

use crate::application::services::ChatError;
use crate::domain::entities::ConversationSummary;
use crate::domain::repositories::ConversationStore;
use crate::domain::value_objects::AuthenticatedUser;

pub struct ListConversationsUseCase {
    conversation_store: Arc<dyn ConversationStore>,
}

impl ListConversationsUseCase {
    pub fn new(conversation_store: Arc<dyn ConversationStore>) -> Self {
        Self { conversation_store }
    }

    pub async fn execute(
        &self,
        user: &AuthenticatedUser,
    ) -> Result<Vec<ConversationSummary>, ChatError> {
        self.conversation_store
            .list_conversations(user.user_id())
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to list conversations");
                ChatError::Failed
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ConversationTurn;
    use crate::infrastructure::memory::InMemoryConversationStore;

    #[tokio::test]
    async fn test_lists_only_callers_conversations() {
        let store = Arc::new(InMemoryConversationStore::new());
        store
            .create_conversation(
                "Budget",
                "alice",
                vec![ConversationTurn::user("q"), ConversationTurn::assistant("a")],
            )
            .await
            .unwrap();
        store.create_conversation("Travel", "bob", Vec::new()).await.unwrap();
        let use_case = ListConversationsUseCase::new(store);

        let alice = AuthenticatedUser::new("alice".to_string()).unwrap();
        let listed = use_case.execute(&alice).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].conversation.title, "Budget");
        assert_eq!(listed[0].last_message, "a");

        let carol = AuthenticatedUser::new("carol".to_string()).unwrap();
        assert!(use_case.execute(&carol).await.unwrap().is_empty());
    }
}
