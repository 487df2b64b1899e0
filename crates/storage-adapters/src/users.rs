use async_trait::async_trait;
use chrono::Utc;
use domains::{
    DomainError, DomainResult, NewUser, ProfileUpdate, User, UserId, UserRepository, UserSummary,
};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use crate::error::db;
use crate::rows;

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: NewUser) -> DomainResult<User> {
        let row = sqlx::query(
            "INSERT INTO users (username, email, created_at) VALUES (?, ?, ?)
             RETURNING id, username, email, bio, skills, interests, created_at",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(rows::millis(Utc::now()))
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if err
                .as_database_error()
                .is_some_and(|e| e.is_unique_violation())
            {
                DomainError::Conflict("Username or email already exists".into())
            } else {
                db(err)
            }
        })?;
        rows::user(&row).map_err(db)
    }

    async fn find(&self, id: UserId) -> DomainResult<Option<User>> {
        sqlx::query(
            "SELECT id, username, email, bio, skills, interests, created_at
             FROM users WHERE id = ?",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?
        .map(|row| rows::user(&row))
        .transpose()
        .map_err(db)
    }

    async fn update_profile(&self, id: UserId, update: ProfileUpdate) -> DomainResult<bool> {
        let result = sqlx::query("UPDATE users SET bio = ?, skills = ?, interests = ? WHERE id = ?")
            .bind(update.bio)
            .bind(update.skills)
            .bind(update.interests)
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(db)?;
        Ok(result.rows_affected() > 0)
    }

    async fn summaries(&self, ids: &[UserId]) -> DomainResult<Vec<UserSummary>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut query = QueryBuilder::<Sqlite>::new("SELECT id, username, bio FROM users WHERE id IN (");
        let mut list = query.separated(", ");
        for id in ids {
            list.push_bind(id.get());
        }
        list.push_unseparated(") ORDER BY username");

        let found = query.build().fetch_all(&self.pool).await.map_err(db)?;
        found
            .iter()
            .map(|row| -> DomainResult<UserSummary> {
                Ok(UserSummary {
                    id: UserId(row.try_get("id").map_err(db)?),
                    username: row.try_get("username").map_err(db)?,
                    bio: row.try_get("bio").map_err(db)?,
                })
            })
            .collect()
    }

    async fn post_count(&self, id: UserId) -> DomainResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE user_id = ? AND is_archived = 0")
            .bind(id.get())
            .fetch_one(&self.pool)
            .await
            .map_err(db)
    }
}
