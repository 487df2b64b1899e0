use async_trait::async_trait;
use chrono::Utc;
use domains::{DomainResult, FollowOutcome, SocialGraphRepository, UserId};
use sqlx::SqlitePool;

use crate::error::db;
use crate::rows;

pub struct SqliteSocialGraphRepository {
    pool: SqlitePool,
}

impl SqliteSocialGraphRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn ids(&self, sql: &str, user: UserId) -> DomainResult<Vec<UserId>> {
        let ids: Vec<i64> = sqlx::query_scalar(sql)
            .bind(user.get())
            .fetch_all(&self.pool)
            .await
            .map_err(db)?;
        Ok(ids.into_iter().map(UserId).collect())
    }

    async fn exists(&self, sql: &str, a: UserId, b: UserId) -> DomainResult<bool> {
        let found: Option<i64> = sqlx::query_scalar(sql)
            .bind(a.get())
            .bind(b.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?;
        Ok(found.is_some())
    }
}

#[async_trait]
impl SocialGraphRepository for SqliteSocialGraphRepository {
    async fn insert_follow(
        &self,
        follower: UserId,
        followee: UserId,
    ) -> DomainResult<FollowOutcome> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO follows (follower_id, followee_id, created_at)
             SELECT ?1, ?2, ?3
             WHERE NOT EXISTS (
                 SELECT 1 FROM blocks
                 WHERE (blocker_id = ?1 AND blocked_id = ?2)
                    OR (blocker_id = ?2 AND blocked_id = ?1)
             )",
        )
        .bind(follower.get())
        .bind(followee.get())
        .bind(rows::millis(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(db)?;
        if result.rows_affected() == 1 {
            return Ok(FollowOutcome::Created);
        }

        // Nothing was written; report why.
        let blocked = self
            .exists(
                "SELECT 1 FROM blocks
                 WHERE (blocker_id = ?1 AND blocked_id = ?2)
                    OR (blocker_id = ?2 AND blocked_id = ?1)",
                follower,
                followee,
            )
            .await?;
        Ok(if blocked {
            FollowOutcome::Blocked
        } else {
            FollowOutcome::AlreadyFollowing
        })
    }

    async fn delete_follow(&self, follower: UserId, followee: UserId) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM follows WHERE follower_id = ? AND followee_id = ?")
            .bind(follower.get())
            .bind(followee.get())
            .execute(&self.pool)
            .await
            .map_err(db)?;
        Ok(result.rows_affected() == 1)
    }

    async fn is_following(&self, follower: UserId, followee: UserId) -> DomainResult<bool> {
        self.exists(
            "SELECT 1 FROM follows WHERE follower_id = ? AND followee_id = ?",
            follower,
            followee,
        )
        .await
    }

    async fn following(&self, user: UserId) -> DomainResult<Vec<UserId>> {
        self.ids(
            "SELECT followee_id FROM follows WHERE follower_id = ? ORDER BY created_at, followee_id",
            user,
        )
        .await
    }

    async fn followers(&self, user: UserId) -> DomainResult<Vec<UserId>> {
        self.ids(
            "SELECT follower_id FROM follows WHERE followee_id = ? ORDER BY created_at, follower_id",
            user,
        )
        .await
    }

    async fn block_and_sever(&self, blocker: UserId, blocked: UserId) -> DomainResult<bool> {
        let mut tx = self.pool.begin().await.map_err(db)?;

        let inserted = sqlx::query(
            "INSERT OR IGNORE INTO blocks (blocker_id, blocked_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(blocker.get())
        .bind(blocked.get())
        .bind(rows::millis(Utc::now()))
        .execute(&mut *tx)
        .await
        .map_err(db)?
        .rows_affected();
        if inserted == 0 {
            // Dropping the transaction rolls it back; nothing changed anyway.
            return Ok(false);
        }

        sqlx::query(
            "DELETE FROM follows
             WHERE (follower_id = ?1 AND followee_id = ?2)
                OR (follower_id = ?2 AND followee_id = ?1)",
        )
        .bind(blocker.get())
        .bind(blocked.get())
        .execute(&mut *tx)
        .await
        .map_err(db)?;

        tx.commit().await.map_err(db)?;
        Ok(true)
    }

    async fn delete_block(&self, blocker: UserId, blocked: UserId) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM blocks WHERE blocker_id = ? AND blocked_id = ?")
            .bind(blocker.get())
            .bind(blocked.get())
            .execute(&self.pool)
            .await
            .map_err(db)?;
        Ok(result.rows_affected() == 1)
    }

    async fn is_blocked(&self, blocker: UserId, blocked: UserId) -> DomainResult<bool> {
        self.exists(
            "SELECT 1 FROM blocks WHERE blocker_id = ? AND blocked_id = ?",
            blocker,
            blocked,
        )
        .await
    }

    async fn blocked_by(&self, blocker: UserId) -> DomainResult<Vec<UserId>> {
        self.ids(
            "SELECT blocked_id FROM blocks WHERE blocker_id = ? ORDER BY blocked_id",
            blocker,
        )
        .await
    }

    async fn blockers_of(&self, user: UserId) -> DomainResult<Vec<UserId>> {
        self.ids(
            "SELECT blocker_id FROM blocks WHERE blocked_id = ? ORDER BY blocker_id",
            user,
        )
        .await
    }
}
