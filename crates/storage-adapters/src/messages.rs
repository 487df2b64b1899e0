use async_trait::async_trait;
use chrono::Utc;
use domains::{
    ConversationSummary, DomainResult, Message, MessageId, MessageRepository, NewMessage, UserId,
};
use sqlx::{Row, SqlitePool};

use crate::error::db;
use crate::rows;

const MESSAGE_COLUMNS: &str =
    "id, sender_id, receiver_id, content, attachment_url, is_read, created_at";

pub struct SqliteMessageRepository {
    pool: SqlitePool,
}

impl SqliteMessageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for SqliteMessageRepository {
    async fn insert(&self, message: NewMessage) -> DomainResult<Message> {
        let sql = format!(
            "INSERT INTO messages (sender_id, receiver_id, content, attachment_url, created_at)
             VALUES (?, ?, ?, ?, ?) RETURNING {MESSAGE_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(message.sender_id.get())
            .bind(message.receiver_id.get())
            .bind(message.content)
            .bind(message.attachment_url)
            .bind(rows::millis(Utc::now()))
            .fetch_one(&self.pool)
            .await
            .map_err(db)?;
        rows::message(&row).map_err(db)
    }

    async fn find(&self, id: MessageId) -> DomainResult<Option<Message>> {
        let sql = format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?");
        sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?
            .map(|row| rows::message(&row))
            .transpose()
            .map_err(db)
    }

    async fn delete(&self, id: MessageId) -> DomainResult<()> {
        sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(db)?;
        Ok(())
    }

    async fn mark_read(&self, id: MessageId) -> DomainResult<()> {
        sqlx::query("UPDATE messages SET is_read = 1 WHERE id = ?")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(db)?;
        Ok(())
    }

    async fn mark_conversation_read(&self, peer: UserId, receiver: UserId) -> DomainResult<u64> {
        let result = sqlx::query(
            "UPDATE messages SET is_read = 1
             WHERE sender_id = ? AND receiver_id = ? AND is_read = 0",
        )
        .bind(peer.get())
        .bind(receiver.get())
        .execute(&self.pool)
        .await
        .map_err(db)?;
        Ok(result.rows_affected())
    }

    async fn unread_count(&self, receiver: UserId) -> DomainResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE receiver_id = ? AND is_read = 0")
            .bind(receiver.get())
            .fetch_one(&self.pool)
            .await
            .map_err(db)
    }

    async fn conversation(&self, user: UserId, peer: UserId) -> DomainResult<Vec<Message>> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE (sender_id = ?1 AND receiver_id = ?2) OR (sender_id = ?2 AND receiver_id = ?1)
             ORDER BY created_at ASC, id ASC"
        );
        let found = sqlx::query(&sql)
            .bind(user.get())
            .bind(peer.get())
            .fetch_all(&self.pool)
            .await
            .map_err(db)?;
        found
            .iter()
            .map(rows::message)
            .collect::<Result<_, _>>()
            .map_err(db)
    }

    async fn conversations(&self, user: UserId) -> DomainResult<Vec<ConversationSummary>> {
        let found = sqlx::query(
            "WITH latest AS (
                 SELECT CASE WHEN sender_id = ?1 THEN receiver_id ELSE sender_id END AS contact_id,
                        MAX(id) AS last_id
                 FROM messages
                 WHERE sender_id = ?1 OR receiver_id = ?1
                 GROUP BY contact_id
             )
             SELECT l.contact_id, u.username AS contact_name, m.content AS last_message,
                    m.created_at AS last_message_time,
                    (SELECT COUNT(*) FROM messages x
                      WHERE x.sender_id = l.contact_id AND x.receiver_id = ?1 AND x.is_read = 0)
                        AS unread_count
             FROM latest l
             JOIN messages m ON m.id = l.last_id
             JOIN users u ON u.id = l.contact_id
             ORDER BY m.created_at DESC, m.id DESC",
        )
        .bind(user.get())
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        found
            .iter()
            .map(|row| -> DomainResult<ConversationSummary> {
                Ok(ConversationSummary {
                    contact_id: UserId(row.try_get("contact_id").map_err(db)?),
                    contact_name: row.try_get("contact_name").map_err(db)?,
                    last_message: row.try_get("last_message").map_err(db)?,
                    last_message_time: rows::timestamp(row, "last_message_time").map_err(db)?,
                    unread_count: row.try_get("unread_count").map_err(db)?,
                })
            })
            .collect()
    }
}
