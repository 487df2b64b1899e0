use async_trait::async_trait;
use chrono::Utc;
use domains::{DomainResult, InteractionKind, InteractionRepository, PostId, UserId};
use sqlx::SqlitePool;

use crate::error::db;
use crate::rows;

pub struct SqliteInteractionRepository {
    pool: SqlitePool,
}

impl SqliteInteractionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InteractionRepository for SqliteInteractionRepository {
    async fn insert(&self, post: PostId, user: UserId, kind: InteractionKind) -> DomainResult<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO post_interactions (post_id, user_id, kind, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(post.get())
        .bind(user.get())
        .bind(kind.as_str())
        .bind(rows::millis(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(db)?;
        Ok(result.rows_affected() == 1)
    }

    async fn remove(&self, post: PostId, user: UserId, kind: InteractionKind) -> DomainResult<bool> {
        let result = sqlx::query(
            "DELETE FROM post_interactions WHERE post_id = ? AND user_id = ? AND kind = ?",
        )
        .bind(post.get())
        .bind(user.get())
        .bind(kind.as_str())
        .execute(&self.pool)
        .await
        .map_err(db)?;
        Ok(result.rows_affected() == 1)
    }

    async fn count(&self, post: PostId, kind: InteractionKind) -> DomainResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM post_interactions WHERE post_id = ? AND kind = ?")
            .bind(post.get())
            .bind(kind.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{store, user};
    use domains::{NewPost, PostRepository};

    #[tokio::test]
    async fn kinds_are_independent_and_insert_is_idempotent() {
        let store = store().await;
        let a = user(&store, "a").await;
        let post = store
            .posts()
            .create(NewPost {
                owner: a,
                content: "hi".into(),
                image_url: None,
                poll: None,
                scheduled_at: None,
            })
            .await
            .unwrap();
        let repo = store.interactions();

        assert!(repo.insert(post.id, a, InteractionKind::Saved).await.unwrap());
        assert!(!repo.insert(post.id, a, InteractionKind::Saved).await.unwrap());
        assert_eq!(repo.count(post.id, InteractionKind::Interested).await.unwrap(), 0);

        assert!(repo.insert(post.id, a, InteractionKind::Interested).await.unwrap());
        assert_eq!(repo.count(post.id, InteractionKind::Interested).await.unwrap(), 1);
        assert!(repo.remove(post.id, a, InteractionKind::Interested).await.unwrap());
        assert!(!repo.remove(post.id, a, InteractionKind::Interested).await.unwrap());
        assert_eq!(repo.count(post.id, InteractionKind::Saved).await.unwrap(), 1);
    }
}
