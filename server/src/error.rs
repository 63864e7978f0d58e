//! Route-boundary error taxonomy.
//!
//! Every handler outside `auth` returns [`ApiError`], rendered as
//! `{"error": CODE, "message": text}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::permissions::{AccessError, LifecycleError, PermissionError};

/// Error response body for JSON responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

/// Errors surfaced to API clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Parent resource absent.
    #[error("{0}")]
    NotFound(&'static str),

    /// Authorization denied.
    #[error("{0}")]
    Forbidden(String),

    /// No authenticated principal.
    #[error("Authentication required")]
    Unauthorized,

    /// Membership lifecycle rule violated.
    #[error("{0}")]
    InvalidTransition(String),

    /// Duplicate membership request, conversation or RSVP.
    #[error("{0}")]
    AlreadyExists(String),

    /// Malformed input.
    #[error("{0}")]
    Validation(String),

    /// Store failure. Details are logged, never returned.
    #[error("Internal server error")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error")]
    Internal(String),
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InvalidTransition(_) | Self::AlreadyExists(_) | Self::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    const fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InvalidTransition(_) => "INVALID_TRANSITION",
            Self::AlreadyExists(_) => "ALREADY_EXISTS",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Database(_) | Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Database(err) => tracing::error!(%err, "API database error"),
            Self::Internal(detail) => tracing::error!(%detail, "API internal error"),
            _ => {}
        }

        let body = Json(ErrorResponse {
            error: self.code().to_string(),
            message: self.to_string(),
        });

        (self.status(), body).into_response()
    }
}

impl From<PermissionError> for ApiError {
    fn from(err: PermissionError) -> Self {
        tracing::debug!(reason = ?err, "Authorization denied");
        match err {
            PermissionError::NotFound(kind) => Self::NotFound(kind.not_found_message()),
            PermissionError::NotAuthenticated => Self::Unauthorized,
            other => Self::Forbidden(other.to_string()),
        }
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Denied(e) => e.into(),
            AccessError::Store(e) => Self::Database(e),
        }
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Permission(e) => e.into(),
            LifecycleError::Store(e) => Self::Database(e),
            LifecycleError::AlreadyRequested
            | LifecycleError::AlreadyMember
            | LifecycleError::OrganizerMembership => Self::AlreadyExists(err.to_string()),
            LifecycleError::ToPending | LifecycleError::Unchanged => {
                Self::InvalidTransition(err.to_string())
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}
