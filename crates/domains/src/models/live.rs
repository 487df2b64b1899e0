use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::notification::Notification;
use crate::ids::UserId;

/// Server → client frames of the live channel.
///
/// Serialized as `{"event": "new_message", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum LiveEvent {
    NewMessage {
        message: String,
        sender_id: UserId,
        timestamp: DateTime<Utc>,
    },
    NewNotification(Notification),
}
