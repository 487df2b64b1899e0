//! # DomainError
//!
//! Centralized error taxonomy for Innovate.
//! Every service operation surfaces one of these kinds; the HTTP layer owns
//! the kind → status mapping so no route invents its own.

use thiserror::Error;

/// The primary error type for all domain and service operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Missing or malformed input (e.g., self-follow, empty message body)
    #[error("validation error: {0}")]
    Validation(String),

    /// Referenced entity absent or not visible (e.g., archived post)
    #[error("{0}")]
    NotFound(String),

    /// Actor lacks rights over the target entity
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// Duplicate or contradicting action (already following, not blocked, ...)
    #[error("{0}")]
    Conflict(String),

    /// Missing, expired or malformed bearer credentials
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Underlying persistence failure. Never retried automatically.
    #[error("store error: {0}")]
    Store(String),
}

impl DomainError {
    pub fn not_found(entity: &str) -> Self {
        Self::NotFound(format!("{entity} not found"))
    }

    pub fn self_reference(action: &str) -> Self {
        Self::Validation(format!("You cannot {action} yourself"))
    }

    /// The human-readable part, without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Validation(m)
            | Self::NotFound(m)
            | Self::NotAuthorized(m)
            | Self::Conflict(m)
            | Self::Unauthenticated(m)
            | Self::Store(m) => m,
        }
    }

    /// Short machine-readable name of the kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::NotAuthorized(_) => "not_authorized",
            Self::Conflict(_) => "conflict",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::Store(_) => "store",
        }
    }
}

/// A specialized Result type for Innovate domain logic.
pub type DomainResult<T> = std::result::Result<T, DomainError>;
