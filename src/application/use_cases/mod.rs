pub mod get_job_status;
pub mod list_conversations;
pub mod list_messages;
pub mod send_message;
pub mod start_conversation;
pub mod submit_document;

pub use get_job_status::GetJobStatusUseCase;
pub use list_conversations::ListConversationsUseCase;
pub use list_messages::ListMessagesUseCase;
pub use send_message::SendMessageUseCase;
pub use start_conversation::StartConversationUseCase;
pub use submit_document::SubmitDocumentUseCase;
