use axum::{Router, routing::post};
use std::sync::Arc;

use crate::presentation::http::handlers::ChatHandler;

pub fn chat_routes(chat_handler: Arc<ChatHandler>) -> Router {
    Router::new()
        .route(
            "/conversations",
            post(ChatHandler::start_conversation).get(ChatHandler::list_conversations),
        )
        .route(
            "/conversations/{conversation_id}/messages",
            post(ChatHandler::send_message).get(ChatHandler::list_messages),
        )
        .with_state(chat_handler)
}
