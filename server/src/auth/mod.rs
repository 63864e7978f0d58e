//! Authentication Service
//!
//! Resolves session identity on every request and issues sessions.

mod error;
mod handlers;
pub mod jwt;
mod middleware;
mod password;

use axum::{
    routing::{get, post},
    Router,
};

use crate::api::AppState;

pub use error::{AuthError, AuthResult};
pub use middleware::{resolve, resolve_principal, AuthUser, Principal};
pub use password::{hash_password, verify_password};

/// Create authentication router.
///
/// - POST /users - Sign up
/// - GET /session - Current user or null
/// - POST /session - Log in
/// - DELETE /session - Log out
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", post(handlers::signup))
        .route(
            "/session",
            get(handlers::current_user)
                .post(handlers::login)
                .delete(handlers::logout),
        )
}
