//! Identity Resolution Middleware
//!
//! Every request gets a [`Principal`]. Resolution never rejects: a missing,
//! malformed, expired or revoked session becomes [`Principal::Anonymous`].

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use sqlx::PgPool;

use super::error::AuthError;
use super::jwt::validate_session_token;
use crate::api::AppState;
use crate::db::{user_exists, Id};

/// The identity making a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Principal {
    User(Id),
    #[default]
    Anonymous,
}

impl Principal {
    #[must_use]
    pub const fn user_id(self) -> Option<Id> {
        match self {
            Self::User(id) => Some(id),
            Self::Anonymous => None,
        }
    }

    /// Whether this principal is exactly the given user.
    #[must_use]
    pub const fn is(self, user_id: Id) -> bool {
        matches!(self, Self::User(id) if id == user_id)
    }

    #[must_use]
    pub const fn is_anonymous(self) -> bool {
        matches!(self, Self::Anonymous)
    }
}

/// Signed-in user, for handlers that refuse anonymous callers.
///
/// Extraction fails with 401 when the principal is anonymous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Id,
}

impl From<AuthUser> for Principal {
    fn from(user: AuthUser) -> Self {
        Self::User(user.id)
    }
}

/// Middleware resolving the session into a [`Principal`] extension.
pub async fn resolve_principal(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let principal = match session_token(request.headers(), &state.config.session_cookie_name) {
        Some(token) => resolve(&state.db, &state.config.jwt_secret, &token).await,
        None => Principal::Anonymous,
    };

    request.extensions_mut().insert(principal);
    next.run(request).await
}

/// Resolve a session token to a principal.
pub async fn resolve(pool: &PgPool, secret: &str, token: &str) -> Principal {
    let user_id = match validate_session_token(token, secret).and_then(|c| c.user_id()) {
        Ok(id) => id,
        Err(e) => {
            tracing::debug!(error = %e, "Discarding unusable session token");
            return Principal::Anonymous;
        }
    };

    match user_exists(pool, user_id).await {
        Ok(true) => Principal::User(user_id),
        Ok(false) => {
            tracing::debug!(user_id, "Session refers to a user that no longer exists");
            Principal::Anonymous
        }
        Err(e) => {
            tracing::warn!(user_id, error = %e, "Failed to look up session user");
            Principal::Anonymous
        }
    }
}

/// Session cookie first, then `Authorization: Bearer`.
fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(cookie_name) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
}

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Self>()
            .copied()
            .unwrap_or_default())
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Principal>() {
            Some(Principal::User(id)) => Ok(Self { id: *id }),
            _ => Err(AuthError::Unauthenticated),
        }
    }
}
