use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    role: TurnRole,
    text: String,
    timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(role: TurnRole, text: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            role,
            text,
            timestamp,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(TurnRole::User, text.into(), Utc::now())
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, text.into(), Utc::now())
    }

    pub fn role(&self) -> TurnRole {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Header of a conversation owned by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub title: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }
}

/// A conversation as shown in the owner's conversation list.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationSummary {
    pub conversation: Conversation,
    /// Text of the most recent turn, empty for a conversation without turns.
    pub last_message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ownership_is_exact() {
        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::new_v4(),
            title: "Rust".to_string(),
            owner_id: "alice".to_string(),
            created_at: now,
            updated_at: now,
        };

        assert!(conversation.is_owned_by("alice"));
        assert!(!conversation.is_owned_by("Alice"));
        assert!(!conversation.is_owned_by(""));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let turn = ConversationTurn::assistant("hello");
        let value = serde_json::to_value(&turn).unwrap();

        assert_eq!(value["role"], "assistant");
        assert_eq!(TurnRole::User.to_string(), "user");
    }
}
