//! Notification rows. `scheduled_time` gates visibility: an entry whose time
//! lies in the future is invisible to listings, counts and mark-all-read.
//! `delivered` is only used by the reminder sweep.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{
    DomainResult, NewNotification, Notification, NotificationId, NotificationRepository, UserId,
};
use sqlx::SqlitePool;

use crate::error::db;
use crate::rows;

const COLUMNS: &str =
    "id, user_id, type, related_id, content, is_read, scheduled_time, created_at";

const DUE: &str = "(scheduled_time IS NULL OR scheduled_time <= ?)";

pub struct SqliteNotificationRepository {
    pool: SqlitePool,
}

impl SqliteNotificationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn all(&self, sql: &str, recipient: UserId) -> DomainResult<Vec<Notification>> {
        let found = sqlx::query(sql)
            .bind(recipient.get())
            .fetch_all(&self.pool)
            .await
            .map_err(db)?;
        found
            .iter()
            .map(rows::notification)
            .collect::<Result<_, _>>()
            .map_err(db)
    }
}

#[async_trait]
impl NotificationRepository for SqliteNotificationRepository {
    async fn insert(&self, notification: NewNotification) -> DomainResult<Notification> {
        let sql = format!(
            "INSERT INTO notifications (user_id, type, related_id, content, scheduled_time, created_at)
             VALUES (?, ?, ?, ?, ?, ?) RETURNING {COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(notification.recipient.get())
            .bind(notification.target.type_name())
            .bind(notification.target.related_id())
            .bind(notification.content)
            .bind(notification.scheduled_time.map(rows::millis))
            .bind(rows::millis(Utc::now()))
            .fetch_one(&self.pool)
            .await
            .map_err(db)?;
        rows::notification(&row).map_err(db)
    }

    async fn find(&self, id: NotificationId) -> DomainResult<Option<Notification>> {
        let sql = format!("SELECT {COLUMNS} FROM notifications WHERE id = ?");
        sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?
            .map(|row| rows::notification(&row))
            .transpose()
            .map_err(db)
    }

    async fn list_due(
        &self,
        recipient: UserId,
        now: DateTime<Utc>,
        limit: i64,
    ) -> DomainResult<Vec<Notification>> {
        // A reminder ranks by the moment it became due, not by when it was set.
        let sql = format!(
            "SELECT {COLUMNS} FROM notifications
             WHERE user_id = ? AND {DUE}
             ORDER BY COALESCE(scheduled_time, created_at) DESC, id DESC
             LIMIT ?"
        );
        let found = sqlx::query(&sql)
            .bind(recipient.get())
            .bind(rows::millis(now))
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(db)?;
        found
            .iter()
            .map(rows::notification)
            .collect::<Result<_, _>>()
            .map_err(db)
    }

    async fn unread_count(&self, recipient: UserId, now: DateTime<Utc>) -> DomainResult<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = 0 AND {DUE}"
        );
        sqlx::query_scalar(&sql)
            .bind(recipient.get())
            .bind(rows::millis(now))
            .fetch_one(&self.pool)
            .await
            .map_err(db)
    }

    async fn mark_read(&self, id: NotificationId) -> DomainResult<()> {
        sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ?")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(db)?;
        Ok(())
    }

    async fn mark_all_read(&self, recipient: UserId, now: DateTime<Utc>) -> DomainResult<u64> {
        let sql = format!(
            "UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0 AND {DUE}"
        );
        let result = sqlx::query(&sql)
            .bind(recipient.get())
            .bind(rows::millis(now))
            .execute(&self.pool)
            .await
            .map_err(db)?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, id: NotificationId) -> DomainResult<()> {
        sqlx::query("DELETE FROM notifications WHERE id = ?")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(db)?;
        Ok(())
    }

    async fn clear_all(&self, recipient: UserId) -> DomainResult<u64> {
        let result = sqlx::query("DELETE FROM notifications WHERE user_id = ?")
            .bind(recipient.get())
            .execute(&self.pool)
            .await
            .map_err(db)?;
        Ok(result.rows_affected())
    }

    async fn reminders(&self, recipient: UserId) -> DomainResult<Vec<Notification>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM notifications
             WHERE user_id = ? AND type = 'reminder'
             ORDER BY scheduled_time ASC, id ASC"
        );
        self.all(&sql, recipient).await
    }

    async fn delete_reminder(&self, id: NotificationId, recipient: UserId) -> DomainResult<bool> {
        let result = sqlx::query(
            "DELETE FROM notifications WHERE id = ? AND user_id = ? AND type = 'reminder'",
        )
        .bind(id.get())
        .bind(recipient.get())
        .execute(&self.pool)
        .await
        .map_err(db)?;
        Ok(result.rows_affected() == 1)
    }

    async fn claim_due_reminders(&self, now: DateTime<Utc>) -> DomainResult<Vec<Notification>> {
        // A single UPDATE ... RETURNING: two sweepers can never claim the
        // same row.
        let sql = format!(
            "UPDATE notifications SET delivered = 1
             WHERE type = 'reminder' AND delivered = 0
               AND scheduled_time IS NOT NULL AND scheduled_time <= ?
             RETURNING {COLUMNS}"
        );
        let found = sqlx::query(&sql)
            .bind(rows::millis(now))
            .fetch_all(&self.pool)
            .await
            .map_err(db)?;
        found
            .iter()
            .map(rows::notification)
            .collect::<Result<_, _>>()
            .map_err(db)
    }
}
