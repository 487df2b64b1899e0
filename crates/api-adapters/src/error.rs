//! # ApiError
//!
//! The single place where error kinds become HTTP statuses. Every body is
//! `{"message": "..."}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domains::DomainError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The request could not be decoded (bad JSON, bad path segment).
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Domain(err) => match err {
                DomainError::Validation(_) | DomainError::Conflict(_) => StatusCode::BAD_REQUEST,
                DomainError::NotFound(_) => StatusCode::NOT_FOUND,
                DomainError::NotAuthorized(_) => StatusCode::FORBIDDEN,
                DomainError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
                DomainError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Domain(DomainError::Store(detail)) => {
                error!(error = %detail, "store failure");
                "Internal server error"
            }
            Self::Domain(err) => err.message(),
            Self::BadRequest(message) => message,
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}
