//! Mapping between SQLite rows and domain models.
//!
//! Columns are read with `try_get` so a schema drift shows up as a
//! [`StorageError`] instead of a panic.

use chrono::{DateTime, Utc};
use domains::{
    AttendanceStatus, Attendee, Community, CommunityId, Event, EventId, EventView, FeedPost,
    Message, MessageId, Notification, NotificationId, NotificationTarget, Poll, Post, PostId,
    User, UserId,
};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::error::StorageError;

pub(crate) fn millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub(crate) fn timestamp(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>, StorageError> {
    let raw: i64 = row.try_get(column)?;
    DateTime::from_timestamp_millis(raw)
        .ok_or_else(|| StorageError::Corrupt(format!("{column} out of range: {raw}")))
}

pub(crate) fn opt_timestamp(
    row: &SqliteRow,
    column: &str,
) -> Result<Option<DateTime<Utc>>, StorageError> {
    let raw: Option<i64> = row.try_get(column)?;
    raw.map(|ms| {
        DateTime::from_timestamp_millis(ms)
            .ok_or_else(|| StorageError::Corrupt(format!("{column} out of range: {ms}")))
    })
    .transpose()
}

/// SQLite has no boolean type; flags are stored as 0/1.
pub(crate) fn flag(row: &SqliteRow, column: &str) -> Result<bool, StorageError> {
    Ok(row.try_get::<i64, _>(column)? != 0)
}

pub(crate) fn user(row: &SqliteRow) -> Result<User, StorageError> {
    Ok(User {
        id: UserId(row.try_get("id")?),
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        bio: row.try_get("bio")?,
        skills: row.try_get("skills")?,
        interests: row.try_get("interests")?,
        created_at: timestamp(row, "created_at")?,
    })
}

pub(crate) fn post(row: &SqliteRow) -> Result<Post, StorageError> {
    let poll = row
        .try_get::<Option<String>, _>("poll_data")?
        .map(|raw| {
            serde_json::from_str::<Poll>(&raw)
                .map_err(|e| StorageError::Corrupt(format!("poll_data: {e}")))
        })
        .transpose()?;

    Ok(Post {
        id: PostId(row.try_get("id")?),
        owner: UserId(row.try_get("user_id")?),
        content: row.try_get("content")?,
        image_url: row.try_get("image_url")?,
        poll,
        is_archived: flag(row, "is_archived")?,
        scheduled_at: opt_timestamp(row, "scheduled_at")?,
        created_at: timestamp(row, "created_at")?,
        updated_at: timestamp(row, "updated_at")?,
    })
}

/// A row of [`crate::posts::FEED_SELECT`].
pub(crate) fn feed_post(row: &SqliteRow, viewer: UserId) -> Result<FeedPost, StorageError> {
    let post = post(row)?;
    Ok(FeedPost {
        is_owner: post.owner == viewer,
        username: row.try_get("username")?,
        interested_count: row.try_get("interested_count")?,
        is_interested: flag(row, "is_interested")?,
        poll_votes: Vec::new(),
        user_vote: None,
        post,
    })
}

pub(crate) fn message(row: &SqliteRow) -> Result<Message, StorageError> {
    Ok(Message {
        id: MessageId(row.try_get("id")?),
        sender_id: UserId(row.try_get("sender_id")?),
        receiver_id: UserId(row.try_get("receiver_id")?),
        content: row.try_get("content")?,
        attachment_url: row.try_get("attachment_url")?,
        is_read: flag(row, "is_read")?,
        created_at: timestamp(row, "created_at")?,
    })
}

pub(crate) fn notification(row: &SqliteRow) -> Result<Notification, StorageError> {
    let kind: String = row.try_get("type")?;
    let target = NotificationTarget::from_parts(&kind, row.try_get("related_id")?)
        .map_err(|e| StorageError::Corrupt(e.to_string()))?;

    Ok(Notification {
        id: NotificationId(row.try_get("id")?),
        recipient: UserId(row.try_get("user_id")?),
        target,
        content: row.try_get("content")?,
        is_read: flag(row, "is_read")?,
        scheduled_time: opt_timestamp(row, "scheduled_time")?,
        created_at: timestamp(row, "created_at")?,
    })
}

pub(crate) fn community(row: &SqliteRow) -> Result<Community, StorageError> {
    Ok(Community {
        id: CommunityId(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        admin_id: UserId(row.try_get("admin_id")?),
        member_count: row.try_get("member_count")?,
        created_at: timestamp(row, "created_at")?,
    })
}

pub(crate) fn event(row: &SqliteRow) -> Result<Event, StorageError> {
    Ok(Event {
        id: EventId(row.try_get("id")?),
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        date: timestamp(row, "date")?,
        creator_id: UserId(row.try_get("creator_id")?),
        created_at: timestamp(row, "created_at")?,
    })
}

fn attendance(raw: &str) -> Result<AttendanceStatus, StorageError> {
    AttendanceStatus::parse(raw)
        .ok_or_else(|| StorageError::Corrupt(format!("attendance status: {raw}")))
}

/// A row of [`crate::communities::SELECT_EVENT_VIEW`].
pub(crate) fn event_view(row: &SqliteRow) -> Result<EventView, StorageError> {
    let status = row
        .try_get::<Option<String>, _>("status")?
        .map(|raw| attendance(&raw))
        .transpose()?;
    Ok(EventView {
        event: event(row)?,
        creator_name: row.try_get("creator_name")?,
        status,
    })
}

pub(crate) fn attendee(row: &SqliteRow) -> Result<Attendee, StorageError> {
    let status: String = row.try_get("status")?;
    Ok(Attendee {
        user_id: UserId(row.try_get("user_id")?),
        username: row.try_get("username")?,
        status: attendance(&status)?,
    })
}
