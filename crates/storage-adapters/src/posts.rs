use async_trait::async_trait;
use chrono::Utc;
use domains::{
    DomainError, DomainResult, FeedOrder, FeedPost, FeedQuery, NewPost, Post, PostId,
    PostRepository, PostUpdate, UserId,
};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use crate::error::{db, StorageError};
use crate::rows;

/// Post columns plus the viewer-relative aggregates. The viewer id is bound
/// right after this prefix.
pub(crate) const FEED_SELECT: &str = "SELECT p.id, p.user_id, p.content, p.image_url, \
     p.poll_data, p.is_archived, p.scheduled_at, p.created_at, p.updated_at, u.username, \
     (SELECT COUNT(*) FROM post_interactions i \
       WHERE i.post_id = p.id AND i.kind = 'interested') AS interested_count, \
     EXISTS (SELECT 1 FROM post_interactions i \
       WHERE i.post_id = p.id AND i.kind = 'interested' AND i.user_id = ";

const FEED_FROM: &str = ") AS is_interested \
     FROM posts p JOIN users u ON u.id = p.user_id \
     WHERE p.is_archived = 0";

pub struct SqlitePostRepository {
    pool: SqlitePool,
}

impl SqlitePostRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn select(viewer: UserId) -> QueryBuilder<'static, Sqlite> {
        let mut query = QueryBuilder::new(FEED_SELECT);
        query.push_bind(viewer.get());
        query.push(FEED_FROM);
        query
    }

    async fn fetch(
        &self,
        mut query: QueryBuilder<'static, Sqlite>,
        viewer: UserId,
    ) -> DomainResult<Vec<FeedPost>> {
        let found = query.build().fetch_all(&self.pool).await.map_err(db)?;
        found
            .iter()
            .map(|row| rows::feed_post(row, viewer))
            .collect::<Result<_, _>>()
            .map_err(db)
    }
}

fn poll_json(post: &NewPost) -> Result<Option<String>, StorageError> {
    post.poll
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| StorageError::Corrupt(format!("poll_data: {e}")))
}

#[async_trait]
impl PostRepository for SqlitePostRepository {
    async fn create(&self, post: NewPost) -> DomainResult<Post> {
        let now = rows::millis(Utc::now());
        let row = sqlx::query(
            "INSERT INTO posts (user_id, content, image_url, poll_data, scheduled_at, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING id, user_id, content, image_url, poll_data, is_archived, scheduled_at,
                       created_at, updated_at",
        )
        .bind(post.owner.get())
        .bind(&post.content)
        .bind(&post.image_url)
        .bind(poll_json(&post).map_err(db)?)
        .bind(post.scheduled_at.map(rows::millis))
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(db)?;
        rows::post(&row).map_err(db)
    }

    async fn find(&self, id: PostId) -> DomainResult<Option<Post>> {
        sqlx::query(
            "SELECT id, user_id, content, image_url, poll_data, is_archived, scheduled_at,
                    created_at, updated_at
             FROM posts WHERE id = ?",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?
        .map(|row| rows::post(&row))
        .transpose()
        .map_err(db)
    }

    async fn update(&self, id: PostId, update: PostUpdate) -> DomainResult<()> {
        sqlx::query(
            "UPDATE posts SET content = ?, image_url = COALESCE(?, image_url), updated_at = ?
             WHERE id = ?",
        )
        .bind(update.content)
        .bind(update.image_url)
        .bind(rows::millis(Utc::now()))
        .bind(id.get())
        .execute(&self.pool)
        .await
        .map_err(db)?;
        Ok(())
    }

    async fn archive(&self, id: PostId) -> DomainResult<()> {
        sqlx::query("UPDATE posts SET is_archived = 1, updated_at = ? WHERE id = ?")
            .bind(rows::millis(Utc::now()))
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(db)?;
        Ok(())
    }

    async fn delete(&self, id: PostId) -> DomainResult<()> {
        let mut tx = self.pool.begin().await.map_err(db)?;
        for sql in [
            "DELETE FROM post_interactions WHERE post_id = ?",
            "DELETE FROM post_poll_votes WHERE post_id = ?",
            "DELETE FROM posts WHERE id = ?",
        ] {
            sqlx::query(sql)
                .bind(id.get())
                .execute(&mut *tx)
                .await
                .map_err(db)?;
        }
        tx.commit().await.map_err(db)
    }

    async fn feed(&self, query: FeedQuery) -> DomainResult<Vec<FeedPost>> {
        let mut sql = Self::select(query.viewer);

        if let Some(authors) = &query.authors {
            if authors.is_empty() {
                return Ok(Vec::new());
            }
            sql.push(" AND p.user_id IN (");
            let mut list = sql.separated(", ");
            for author in authors {
                list.push_bind(author.get());
            }
            list.push_unseparated(")");
        }
        if !query.excluded_authors.is_empty() {
            sql.push(" AND p.user_id NOT IN (");
            let mut list = sql.separated(", ");
            for author in &query.excluded_authors {
                list.push_bind(author.get());
            }
            list.push_unseparated(")");
        }
        if let Some(after) = query.created_after {
            sql.push(" AND p.created_at >= ");
            sql.push_bind(rows::millis(after));
        }

        sql.push(match query.order {
            FeedOrder::Newest => " ORDER BY p.created_at DESC, p.id DESC",
            FeedOrder::MostInterested => {
                " ORDER BY interested_count DESC, p.created_at DESC, p.id DESC"
            }
        });
        sql.push(" LIMIT ");
        sql.push_bind(query.limit);

        self.fetch(sql, query.viewer).await
    }

    async fn find_for_viewer(&self, id: PostId, viewer: UserId) -> DomainResult<Option<FeedPost>> {
        let mut sql = Self::select(viewer);
        sql.push(" AND p.id = ");
        sql.push_bind(id.get());
        Ok(self.fetch(sql, viewer).await?.into_iter().next())
    }

    async fn by_author(&self, author: UserId, viewer: UserId) -> DomainResult<Vec<FeedPost>> {
        let mut sql = Self::select(viewer);
        sql.push(" AND p.user_id = ");
        sql.push_bind(author.get());
        sql.push(" ORDER BY p.created_at DESC, p.id DESC");
        self.fetch(sql, viewer).await
    }

    async fn saved_by(&self, user: UserId) -> DomainResult<Vec<FeedPost>> {
        let mut sql = Self::select(user);
        sql.push(
            " AND p.id IN (SELECT post_id FROM post_interactions \
             WHERE kind = 'saved' AND user_id = ",
        );
        sql.push_bind(user.get());
        sql.push(") ORDER BY p.created_at DESC, p.id DESC");
        self.fetch(sql, user).await
    }

    async fn insert_vote(&self, post: PostId, user: UserId, option: i64) -> DomainResult<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO post_poll_votes (post_id, user_id, option_index, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(post.get())
        .bind(user.get())
        .bind(option)
        .bind(rows::millis(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(db)?;
        Ok(result.rows_affected() == 1)
    }

    async fn vote_counts(&self, post: PostId, options: usize) -> DomainResult<Vec<i64>> {
        let tallies = sqlx::query(
            "SELECT option_index, COUNT(*) AS votes FROM post_poll_votes
             WHERE post_id = ? GROUP BY option_index",
        )
        .bind(post.get())
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        let mut counts = vec![0; options];
        for row in &tallies {
            let index: i64 = row.try_get("option_index").map_err(db)?;
            let votes: i64 = row.try_get("votes").map_err(db)?;
            match usize::try_from(index).ok().filter(|i| *i < options) {
                Some(i) => counts[i] = votes,
                None => {
                    return Err(DomainError::Store(format!(
                        "vote for option {index} outside the poll"
                    )))
                }
            }
        }
        Ok(counts)
    }

    async fn vote_of(&self, post: PostId, user: UserId) -> DomainResult<Option<i64>> {
        sqlx::query_scalar(
            "SELECT option_index FROM post_poll_votes WHERE post_id = ? AND user_id = ?",
        )
        .bind(post.get())
        .bind(user.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(db)
    }
}
