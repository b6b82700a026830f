use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::use_cases::{
    send_message::SendMessageResponse, start_conversation::StartConversationResponse,
};
use crate::domain::entities::{Conversation, ConversationSummary, ConversationTurn};

#[derive(Debug, Deserialize)]
pub struct ChatMessageRequestDto {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StartConversationResponseDto {
    pub conversation_id: Uuid,
    pub title: String,
    pub response: String,
}

impl From<StartConversationResponse> for StartConversationResponseDto {
    fn from(response: StartConversationResponse) -> Self {
        Self {
            conversation_id: response.conversation_id,
            title: response.title,
            response: response.response,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponseDto {
    pub conversation_id: Uuid,
    pub response: String,
}

impl From<SendMessageResponse> for SendMessageResponseDto {
    fn from(response: SendMessageResponse) -> Self {
        Self {
            conversation_id: response.conversation_id,
            response: response.response,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageDto {
    pub role: String,
    pub text: String,
    pub timestamp: String,
}

impl From<&ConversationTurn> for MessageDto {
    fn from(turn: &ConversationTurn) -> Self {
        Self {
            role: turn.role().as_str().to_string(),
            text: turn.text().to_string(),
            timestamp: turn.timestamp().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConversationMessagesDto {
    pub conversation_id: Uuid,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
    pub messages: Vec<MessageDto>,
}

impl ConversationMessagesDto {
    pub fn new(conversation: Conversation, turns: &[ConversationTurn]) -> Self {
        Self {
            conversation_id: conversation.id,
            title: conversation.title,
            created_at: conversation.created_at.to_rfc3339(),
            updated_at: conversation.updated_at.to_rfc3339(),
            messages: turns.iter().map(MessageDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConversationSummaryDto {
    pub conversation_id: Uuid,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
    pub last_message: String,
}

impl From<ConversationSummary> for ConversationSummaryDto {
    fn from(summary: ConversationSummary) -> Self {
        Self {
            conversation_id: summary.conversation.id,
            title: summary.conversation.title,
            created_at: summary.conversation.created_at.to_rfc3339(),
            updated_at: summary.conversation.updated_at.to_rfc3339(),
            last_message: summary.last_message,
        }
    }
}
