use async_trait::async_trait;
use chrono::Utc;
use domains::{
    AttendanceStatus, Attendee, Community, CommunityId, CommunityRepository, DomainResult, Event,
    EventId, EventRepository, EventUpdate, EventView, NewCommunity, NewEvent, UserId,
};
use sqlx::SqlitePool;

use crate::error::db;
use crate::rows;

const SELECT_COMMUNITY: &str = "SELECT c.id, c.name, c.description, c.admin_id, c.created_at, \
     (SELECT COUNT(*) FROM community_members m WHERE m.community_id = c.id) AS member_count \
     FROM communities c";

/// Events joined with their creator and the attendance row of the viewer,
/// who is bound as `?1`.
pub(crate) const SELECT_EVENT_VIEW: &str =
    "SELECT e.id, e.title, e.description, e.date, e.creator_id, e.created_at, \
     u.username AS creator_name, a.status \
     FROM events e \
     JOIN users u ON u.id = e.creator_id \
     LEFT JOIN event_attendees a ON a.event_id = e.id AND a.user_id = ?1";

pub struct SqliteCommunityRepository {
    pool: SqlitePool,
}

impl SqliteCommunityRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommunityRepository for SqliteCommunityRepository {
    async fn create(&self, community: NewCommunity) -> DomainResult<Community> {
        let now = rows::millis(Utc::now());
        let mut tx = self.pool.begin().await.map_err(db)?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO communities (name, description, admin_id, created_at)
             VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(&community.name)
        .bind(&community.description)
        .bind(community.admin_id.get())
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(db)?;

        sqlx::query("INSERT INTO community_members (community_id, user_id, joined_at) VALUES (?, ?, ?)")
            .bind(id)
            .bind(community.admin_id.get())
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(db)?;

        let row = sqlx::query(&format!("{SELECT_COMMUNITY} WHERE c.id = ?"))
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .map_err(db)?;
        tx.commit().await.map_err(db)?;
        rows::community(&row).map_err(db)
    }

    async fn find(&self, id: CommunityId) -> DomainResult<Option<Community>> {
        sqlx::query(&format!("{SELECT_COMMUNITY} WHERE c.id = ?"))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?
        .map(|row| rows::community(&row))
        .transpose()
        .map_err(db)
    }

    async fn list(&self) -> DomainResult<Vec<Community>> {
        let found = sqlx::query(&format!("{SELECT_COMMUNITY} ORDER BY member_count DESC, c.id"))
            .fetch_all(&self.pool)
            .await
            .map_err(db)?;
        found
            .iter()
            .map(rows::community)
            .collect::<Result<_, _>>()
            .map_err(db)
    }

    async fn for_member(&self, user: UserId) -> DomainResult<Vec<Community>> {
        let found = sqlx::query(&format!(
            "{SELECT_COMMUNITY} JOIN community_members cm ON cm.community_id = c.id \
             WHERE cm.user_id = ? ORDER BY c.name, c.id"
        ))
        .bind(user.get())
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;
        found
            .iter()
            .map(rows::community)
            .collect::<Result<_, _>>()
            .map_err(db)
    }

    async fn is_member(&self, id: CommunityId, user: UserId) -> DomainResult<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM community_members WHERE community_id = ? AND user_id = ?",
        )
        .bind(id.get())
        .bind(user.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?;
        Ok(found.is_some())
    }

    async fn add_member(&self, id: CommunityId, user: UserId) -> DomainResult<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO community_members (community_id, user_id, joined_at)
             VALUES (?, ?, ?)",
        )
        .bind(id.get())
        .bind(user.get())
        .bind(rows::millis(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(db)?;
        Ok(result.rows_affected() == 1)
    }

    async fn remove_member(&self, id: CommunityId, user: UserId) -> DomainResult<bool> {
        let result =
            sqlx::query("DELETE FROM community_members WHERE community_id = ? AND user_id = ?")
                .bind(id.get())
                .bind(user.get())
                .execute(&self.pool)
                .await
                .map_err(db)?;
        Ok(result.rows_affected() == 1)
    }
}

pub struct SqliteEventRepository {
    pool: SqlitePool,
}

impl SqliteEventRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for SqliteEventRepository {
    async fn create(&self, event: NewEvent, invitees: &[UserId]) -> DomainResult<Event> {
        let mut tx = self.pool.begin().await.map_err(db)?;

        let row = sqlx::query(
            "INSERT INTO events (title, description, date, creator_id, created_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id, title, description, date, creator_id, created_at",
        )
        .bind(&event.title)
        .bind(&event.description)
        .bind(rows::millis(event.date))
        .bind(event.creator_id.get())
        .bind(rows::millis(Utc::now()))
        .fetch_one(&mut *tx)
        .await
        .map_err(db)?;
        let created = rows::event(&row).map_err(db)?;

        // Unknown user ids are skipped rather than failing the whole event.
        for invitee in invitees {
            sqlx::query(
                "INSERT OR IGNORE INTO event_attendees (event_id, user_id, status)
                 SELECT ?, id, 'pending' FROM users WHERE id = ?",
            )
            .bind(created.id.get())
            .bind(invitee.get())
            .execute(&mut *tx)
            .await
            .map_err(db)?;
        }
        tx.commit().await.map_err(db)?;
        Ok(created)
    }

    async fn find(&self, id: EventId) -> DomainResult<Option<Event>> {
        sqlx::query(
            "SELECT id, title, description, date, creator_id, created_at FROM events WHERE id = ?",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?
        .map(|row| rows::event(&row))
        .transpose()
        .map_err(db)
    }

    async fn view(&self, id: EventId, viewer: UserId) -> DomainResult<Option<EventView>> {
        sqlx::query(&format!("{SELECT_EVENT_VIEW} WHERE e.id = ?2"))
            .bind(viewer.get())
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?
            .map(|row| rows::event_view(&row))
            .transpose()
            .map_err(db)
    }

    async fn for_user(&self, user: UserId) -> DomainResult<Vec<EventView>> {
        let found = sqlx::query(&format!(
            "{SELECT_EVENT_VIEW} WHERE e.creator_id = ?1 OR a.user_id IS NOT NULL \
             ORDER BY e.date, e.id"
        ))
        .bind(user.get())
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;
        found
            .iter()
            .map(rows::event_view)
            .collect::<Result<_, _>>()
            .map_err(db)
    }

    async fn attendees(&self, id: EventId) -> DomainResult<Vec<Attendee>> {
        let found = sqlx::query(
            "SELECT a.user_id, a.status, u.username
             FROM event_attendees a
             JOIN users u ON u.id = a.user_id
             WHERE a.event_id = ?
             ORDER BY u.username, a.user_id",
        )
        .bind(id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;
        found
            .iter()
            .map(rows::attendee)
            .collect::<Result<_, _>>()
            .map_err(db)
    }

    async fn update(&self, id: EventId, update: EventUpdate) -> DomainResult<()> {
        sqlx::query("UPDATE events SET title = ?, description = ?, date = ? WHERE id = ?")
            .bind(&update.title)
            .bind(&update.description)
            .bind(rows::millis(update.date))
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(db)?;
        Ok(())
    }

    async fn delete(&self, id: EventId) -> DomainResult<()> {
        let mut tx = self.pool.begin().await.map_err(db)?;
        sqlx::query("DELETE FROM event_attendees WHERE event_id = ?")
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(db)?;
        sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(db)?;
        tx.commit().await.map_err(db)?;
        Ok(())
    }

    async fn set_attendance(
        &self,
        id: EventId,
        user: UserId,
        status: AttendanceStatus,
    ) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO event_attendees (event_id, user_id, status) VALUES (?, ?, ?)
             ON CONFLICT (event_id, user_id) DO UPDATE SET status = excluded.status",
        )
        .bind(id.get())
        .bind(user.get())
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .map_err(db)?;
        Ok(())
    }
}
