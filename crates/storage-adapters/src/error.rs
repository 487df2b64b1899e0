use domains::DomainError;
use thiserror::Error;

/// Failures of the SQLite adapters. They surface to services as
/// [`DomainError::Store`].
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// A stored value that no longer decodes into the domain model.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl From<StorageError> for DomainError {
    fn from(err: StorageError) -> Self {
        DomainError::Store(err.to_string())
    }
}

/// `map_err` adapter for repository methods.
pub(crate) fn db<E: Into<StorageError>>(err: E) -> DomainError {
    let err: StorageError = err.into();
    err.into()
}
