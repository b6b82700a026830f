use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::services::ChatError;
use crate::application::use_cases::{
    ListConversationsUseCase, ListMessagesUseCase, SendMessageUseCase, StartConversationUseCase,
};
use crate::presentation::http::auth::CurrentUser;
use crate::presentation::http::dto::{
    ApiResponse, ChatMessageRequestDto, ConversationMessagesDto, ConversationSummaryDto,
    SendMessageResponseDto, StartConversationResponseDto,
};

pub struct ChatHandler {
    start_conversation_use_case: Arc<StartConversationUseCase>,
    send_message_use_case: Arc<SendMessageUseCase>,
    list_messages_use_case: Arc<ListMessagesUseCase>,
    list_conversations_use_case: Arc<ListConversationsUseCase>,
}

/// Provider and storage details stay in the logs; clients only learn that
/// the request failed.
fn chat_error<T>(error: ChatError) -> (StatusCode, Json<ApiResponse<T>>) {
    let (status, code) = match &error {
        ChatError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
        ChatError::ConversationNotFound(_) => (StatusCode::NOT_FOUND, "CONVERSATION_NOT_FOUND"),
        ChatError::Failed => (StatusCode::INTERNAL_SERVER_ERROR, "CHAT_FAILED"),
    };
    ApiResponse::failure(status, code, error.to_string())
}

impl ChatHandler {
    pub fn new(
        start_conversation_use_case: Arc<StartConversationUseCase>,
        send_message_use_case: Arc<SendMessageUseCase>,
        list_messages_use_case: Arc<ListMessagesUseCase>,
        list_conversations_use_case: Arc<ListConversationsUseCase>,
    ) -> Self {
        Self {
            start_conversation_use_case,
            send_message_use_case,
            list_messages_use_case,
            list_conversations_use_case,
        }
    }

    pub async fn start_conversation(
        State(handler): State<Arc<ChatHandler>>,
        CurrentUser(user): CurrentUser,
        Json(request): Json<ChatMessageRequestDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler
            .start_conversation_use_case
            .execute(&user, &request.message)
            .await
        {
            Ok(response) => {
                let dto = StartConversationResponseDto::from(response);
                Ok((StatusCode::CREATED, Json(ApiResponse::success(dto))))
            }
            Err(e) => Ok(chat_error(e)),
        }
    }

    pub async fn send_message(
        State(handler): State<Arc<ChatHandler>>,
        CurrentUser(user): CurrentUser,
        Path(conversation_id): Path<Uuid>,
        Json(request): Json<ChatMessageRequestDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler
            .send_message_use_case
            .execute(&user, conversation_id, &request.message)
            .await
        {
            Ok(response) => {
                let dto = SendMessageResponseDto::from(response);
                Ok((StatusCode::OK, Json(ApiResponse::success(dto))))
            }
            Err(e) => Ok(chat_error(e)),
        }
    }

    pub async fn list_messages(
        State(handler): State<Arc<ChatHandler>>,
        CurrentUser(user): CurrentUser,
        Path(conversation_id): Path<Uuid>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler
            .list_messages_use_case
            .execute(&user, conversation_id)
            .await
        {
            Ok((conversation, turns)) => {
                let dto = ConversationMessagesDto::new(conversation, &turns);
                Ok((StatusCode::OK, Json(ApiResponse::success(dto))))
            }
            Err(e) => Ok(chat_error(e)),
        }
    }

    pub async fn list_conversations(
        State(handler): State<Arc<ChatHandler>>,
        CurrentUser(user): CurrentUser,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.list_conversations_use_case.execute(&user).await {
            Ok(summaries) => {
                let dtos: Vec<ConversationSummaryDto> =
                    summaries.into_iter().map(ConversationSummaryDto::from).collect();
                Ok((StatusCode::OK, Json(ApiResponse::success(dtos))))
            }
            Err(e) => Ok(chat_error(e)),
        }
    }
}
