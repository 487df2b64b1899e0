use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{MessageId, UserId};

/// A private message. Only the sender may delete it; only the receiver may
/// flip `is_read`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: Option<String>,
    pub attachment_url: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: Option<String>,
    pub attachment_url: Option<String>,
}

/// A message as seen by one participant of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    #[serde(flatten)]
    pub message: Message,
    pub is_outgoing: bool,
}

/// One row of the conversation list: latest message per contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub contact_id: UserId,
    pub contact_name: String,
    pub last_message: Option<String>,
    pub last_message_time: DateTime<Utc>,
    pub unread_count: i64,
}
