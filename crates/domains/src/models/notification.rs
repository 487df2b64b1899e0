use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, DomainResult};
use crate::ids::{CommunityId, EventId, NotificationId, PostId, UserId};

/// What a notification points at. The variant fixes how the related id is
/// interpreted, so a rendering layer can never read an event id as a user id.
///
/// On the wire this flattens to `{"type": "follow", "related_id": 7}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "related_id", rename_all = "snake_case")]
pub enum NotificationTarget {
    /// The user who started following.
    Follow(UserId),
    /// The post that received interest.
    Interest(PostId),
    Comment(PostId),
    /// The sender of the message.
    Message(UserId),
    EventInvite(EventId),
    CommunityJoin(CommunityId),
    /// The post the reminder is about.
    Reminder(PostId),
}

impl NotificationTarget {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Follow(_) => "follow",
            Self::Interest(_) => "interest",
            Self::Comment(_) => "comment",
            Self::Message(_) => "message",
            Self::EventInvite(_) => "event_invite",
            Self::CommunityJoin(_) => "community_join",
            Self::Reminder(_) => "reminder",
        }
    }

    pub fn related_id(&self) -> i64 {
        match *self {
            Self::Follow(id) | Self::Message(id) => id.get(),
            Self::Interest(id) | Self::Comment(id) | Self::Reminder(id) => id.get(),
            Self::EventInvite(id) => id.get(),
            Self::CommunityJoin(id) => id.get(),
        }
    }

    /// Rebuilds a target from its stored `(type, related_id)` columns.
    pub fn from_parts(type_name: &str, related_id: Option<i64>) -> DomainResult<Self> {
        let id = related_id.ok_or_else(|| {
            DomainError::Validation(format!("{type_name} notification without related id"))
        })?;
        let target = match type_name {
            "follow" => Self::Follow(UserId(id)),
            "interest" => Self::Interest(PostId(id)),
            "comment" => Self::Comment(PostId(id)),
            "message" => Self::Message(UserId(id)),
            "event_invite" => Self::EventInvite(EventId(id)),
            "community_join" => Self::CommunityJoin(CommunityId(id)),
            "reminder" => Self::Reminder(PostId(id)),
            other => {
                return Err(DomainError::Validation(format!(
                    "unknown notification type {other}"
                )))
            }
        };
        Ok(target)
    }
}

/// Durable record of a social event awaiting acknowledgment by its recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "user_id")]
    pub recipient: UserId,
    #[serde(flatten)]
    pub target: NotificationTarget,
    pub content: String,
    pub is_read: bool,
    /// Reminders only: the moment the entry becomes due.
    pub scheduled_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Whether the entry should surface to its recipient at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.scheduled_time.map_or(true, |at| at <= now)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub recipient: UserId,
    pub target: NotificationTarget,
    pub content: String,
    pub scheduled_time: Option<DateTime<Utc>>,
}

/// Response shape of a freshly scheduled reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: NotificationId,
    pub scheduled_time: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_flattens_to_type_and_related_id() {
        let n = Notification {
            id: NotificationId(1),
            recipient: UserId(2),
            target: NotificationTarget::Interest(PostId(9)),
            content: "alice showed interest in your post".into(),
            is_read: false,
            scheduled_time: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "interest");
        assert_eq!(json["related_id"], 9);
        assert_eq!(json["user_id"], 2);
    }

    #[test]
    fn from_parts_rejects_unknown_type_and_missing_id() {
        assert_eq!(
            NotificationTarget::from_parts("event_invite", Some(4)).unwrap(),
            NotificationTarget::EventInvite(EventId(4))
        );
        assert!(NotificationTarget::from_parts("poke", Some(1)).is_err());
        assert!(NotificationTarget::from_parts("follow", None).is_err());
    }

    #[test]
    fn only_elapsed_reminders_are_due() {
        let now = Utc::now();
        let mut n = Notification {
            id: NotificationId(1),
            recipient: UserId(1),
            target: NotificationTarget::Reminder(PostId(3)),
            content: String::new(),
            is_read: false,
            scheduled_time: Some(now + chrono::Duration::hours(2)),
            created_at: now,
        };
        assert!(!n.is_due(now));
        n.scheduled_time = Some(now - chrono::Duration::seconds(1));
        assert!(n.is_due(now));
    }
}
