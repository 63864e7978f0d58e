//! Conversation Type Definitions

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::{Conversation, Id, Message};

/// Start a conversation with another user.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    pub user_id: Id,
}

/// New message, or replacement content for an existing one.
#[derive(Debug, Deserialize, Validate)]
pub struct MessageRequest {
    #[validate(length(min = 1, max = 4000, message = "Message must be 1-4000 characters"))]
    pub content: String,
}

/// Conversation with its messages, oldest first.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationDetail {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}
