use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, DomainResult};
use crate::ids::{PostId, UserId};

/// The fundamental unit of publishing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    #[serde(rename = "user_id")]
    pub owner: UserId,
    pub content: String,
    pub image_url: Option<String>,
    #[serde(rename = "poll_data")]
    pub poll: Option<Poll>,
    /// Soft delete: hidden from every feed, the id stays valid.
    pub is_archived: bool,
    /// Stored for the scheduling collaborator; never interpreted here.
    pub scheduled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Archived posts behave as missing for every non-owner operation.
    pub fn is_visible(&self) -> bool {
        !self.is_archived
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    pub question: String,
    pub options: Vec<String>,
}

impl Poll {
    pub fn validate(&self) -> DomainResult<()> {
        if self.question.trim().is_empty() {
            return Err(DomainError::Validation("Poll question is required".into()));
        }
        if self.options.iter().filter(|o| !o.trim().is_empty()).count() < 2 {
            return Err(DomainError::Validation(
                "Poll needs at least two options".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub owner: UserId,
    pub content: String,
    pub image_url: Option<String>,
    pub poll: Option<Poll>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Owner-only edit. `image_url: None` keeps the current image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostUpdate {
    pub content: String,
    pub image_url: Option<String>,
}

/// A post decorated with the viewer-relative aggregates, all computed on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPost {
    #[serde(flatten)]
    pub post: Post,
    pub username: String,
    pub interested_count: i64,
    pub is_interested: bool,
    pub is_owner: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub poll_votes: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_vote: Option<i64>,
}

/// A typed fact linking a user to a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Interested,
    Saved,
}

impl InteractionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Interested => "interested",
            Self::Saved => "saved",
        }
    }
}

/// Feed selection predicate and ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedMode {
    #[default]
    All,
    Following,
    Trending,
}

impl FeedMode {
    /// Unknown or missing filters fall back to `All`, matching the query
    /// string contract of the feed route.
    pub fn from_filter(filter: Option<&str>) -> Self {
        match filter {
            Some("following") => Self::Following,
            Some("trending") => Self::Trending,
            _ => Self::All,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOrder {
    /// `created_at DESC`
    Newest,
    /// interested count DESC, then `created_at DESC`
    MostInterested,
}

/// The store-level description of one feed read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub viewer: UserId,
    /// `None` means any author; `Some(vec![])` is never sent by the composer.
    pub authors: Option<Vec<UserId>>,
    pub excluded_authors: Vec<UserId>,
    pub created_after: Option<DateTime<Utc>>,
    pub order: FeedOrder,
    pub limit: i64,
}
