use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// A registered member. Graph relations live in their own tables and are
/// never embedded here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub bio: String,
    pub skills: String,
    pub interests: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a user row. Credentials are owned by the auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
}

/// Free-text profile fields; missing values are stored as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub skills: String,
    #[serde(default)]
    pub interests: String,
}

/// The compact shape used in follower/following listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub bio: String,
}

/// A listing row annotated with whether the viewer follows that user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEntry {
    #[serde(flatten)]
    pub user: UserSummary,
    pub is_following: bool,
}

/// A profile as rendered for a viewer.
///
/// `email` and `blocked_users` are only populated when viewers look at
/// themselves; `is_following` only when they look at someone else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub bio: String,
    pub skills: String,
    pub interests: String,
    pub following: Vec<UserId>,
    pub followers: Vec<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_users: Option<Vec<UserId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_following: Option<bool>,
    pub post_count: i64,
}

/// What a follow insert did. A block in either direction wins over an
/// existing edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Created,
    AlreadyFollowing,
    Blocked,
}
