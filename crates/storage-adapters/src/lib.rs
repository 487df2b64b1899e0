//! # storage-adapters
//!
//! SQLite implementations of the repository ports in `domains`.
//!
//! Relationships (follows, blocks, interactions, votes, memberships) are
//! join tables keyed by the pair they connect, so duplicate detection is a
//! matter of `INSERT OR IGNORE` plus `rows_affected`, never a read followed
//! by a write.

mod error;
mod rows;

pub mod communities;
pub mod graph;
pub mod interactions;
pub mod messages;
pub mod notifications;
pub mod posts;
pub mod users;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::info;

pub use communities::{SqliteCommunityRepository, SqliteEventRepository};
pub use error::StorageError;
pub use graph::SqliteSocialGraphRepository;
pub use interactions::SqliteInteractionRepository;
pub use messages::SqliteMessageRepository;
pub use notifications::SqliteNotificationRepository;
pub use posts::SqlitePostRepository;
pub use users::SqliteUserRepository;

/// Owns the connection pool and hands out one repository per port. The pool
/// is reference counted, so every repository shares it.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        info!(url, max_connections, "sqlite pool ready");
        Ok(Self { pool })
    }

    /// A private in-memory database, migrated and ready.
    ///
    /// Every connection to `:memory:` is its own database, so the pool is
    /// pinned to a single connection that is never recycled.
    pub async fn in_memory() -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn users(&self) -> SqliteUserRepository {
        SqliteUserRepository::new(self.pool.clone())
    }

    pub fn graph(&self) -> SqliteSocialGraphRepository {
        SqliteSocialGraphRepository::new(self.pool.clone())
    }

    pub fn posts(&self) -> SqlitePostRepository {
        SqlitePostRepository::new(self.pool.clone())
    }

    pub fn interactions(&self) -> SqliteInteractionRepository {
        SqliteInteractionRepository::new(self.pool.clone())
    }

    pub fn messages(&self) -> SqliteMessageRepository {
        SqliteMessageRepository::new(self.pool.clone())
    }

    pub fn notifications(&self) -> SqliteNotificationRepository {
        SqliteNotificationRepository::new(self.pool.clone())
    }

    pub fn communities(&self) -> SqliteCommunityRepository {
        SqliteCommunityRepository::new(self.pool.clone())
    }

    pub fn events(&self) -> SqliteEventRepository {
        SqliteEventRepository::new(self.pool.clone())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use domains::{NewUser, UserId, UserRepository};

    use super::SqliteStore;

    pub async fn store() -> SqliteStore {
        SqliteStore::in_memory().await.unwrap()
    }

    pub async fn user(store: &SqliteStore, name: &str) -> UserId {
        store
            .users()
            .create(NewUser {
                username: name.into(),
                email: format!("{name}@example.com"),
            })
            .await
            .unwrap()
            .id
    }
}
