//! Session HTTP Handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use validator::Validate;

use super::error::{AuthError, AuthResult};
use super::jwt::issue_session_token;
use super::middleware::{AuthUser, Principal};
use super::password::{hash_password, verify_password};
use crate::api::AppState;
use crate::config::Config;
use crate::db::{self, User};

// ============================================================================
// Request Types
// ============================================================================

/// Signup request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(length(min = 4, max = 30))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 50))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50))]
    pub last_name: String,
}

/// Login request. `credential` is a username or an email address.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub credential: String,
    pub password: String,
}

// ============================================================================
// Helpers
// ============================================================================

fn session_cookie(config: &Config, token: String) -> Cookie<'static> {
    Cookie::build((config.session_cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(config.jwt_expiry))
        .build()
}

fn start_session(state: &AppState, jar: CookieJar, user_id: db::Id) -> AuthResult<CookieJar> {
    let token = issue_session_token(user_id, &state.config.jwt_secret, state.config.jwt_expiry)?;
    Ok(jar.add(session_cookie(&state.config, token)))
}

// ============================================================================
// Handlers
// ============================================================================

/// Create an account and start a session.
///
/// POST /api/users
#[tracing::instrument(skip(state, jar, body), fields(username = %body.username))]
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<SignupRequest>,
) -> AuthResult<(StatusCode, CookieJar, Json<User>)> {
    body.validate()
        .map_err(|e| AuthError::Validation(e.to_string()))?;

    if db::username_exists(&state.db, &body.username).await?
        || db::email_exists(&state.db, &body.email).await?
    {
        return Err(AuthError::UserAlreadyExists);
    }

    let password_hash = hash_password(&body.password).map_err(|_| AuthError::PasswordHash)?;

    let user = db::create_user(
        &state.db,
        db::NewUser {
            username: &body.username,
            email: &body.email,
            first_name: &body.first_name,
            last_name: &body.last_name,
            password_hash: &password_hash,
        },
    )
    .await?
    // Unique constraint caught a concurrent signup
    .ok_or(AuthError::UserAlreadyExists)?;

    let jar = start_session(&state, jar, user.id)?;
    tracing::info!(user_id = user.id, "User signed up");

    Ok((StatusCode::CREATED, jar, Json(user)))
}

/// Log in with username or email.
///
/// POST /api/session
#[tracing::instrument(skip(state, jar, body), fields(credential = %body.credential))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> AuthResult<(CookieJar, Json<User>)> {
    let Some(user) = db::find_user_by_credential(&state.db, &body.credential).await? else {
        return Err(AuthError::InvalidCredentials);
    };

    let valid =
        verify_password(&body.password, &user.password_hash).map_err(|_| AuthError::PasswordHash)?;
    if !valid {
        return Err(AuthError::InvalidCredentials);
    }

    let jar = start_session(&state, jar, user.id)?;
    tracing::info!(user_id = user.id, "User logged in");

    Ok((jar, Json(user)))
}

/// Clear the session cookie.
///
/// DELETE /api/session
#[tracing::instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    auth_user: AuthUser,
    jar: CookieJar,
) -> (CookieJar, Json<serde_json::Value>) {
    let removal = Cookie::build((state.config.session_cookie_name.clone(), ""))
        .path("/")
        .build();

    tracing::info!(user_id = auth_user.id, "User logged out");
    (jar.remove(removal), Json(serde_json::json!({ "message": "success" })))
}

/// Current user, or `null` for anonymous callers.
///
/// GET /api/session
#[tracing::instrument(skip(state))]
pub async fn current_user(
    State(state): State<AppState>,
    principal: Principal,
) -> AuthResult<Json<Option<User>>> {
    let Some(user_id) = principal.user_id() else {
        return Ok(Json(None));
    };

    Ok(Json(db::find_user_by_id(&state.db, user_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_validation() {
        let valid = SignupRequest {
            username: "demo-user".to_string(),
            email: "demo@example.com".to_string(),
            password: "password".to_string(),
            first_name: "Demo".to_string(),
            last_name: "User".to_string(),
        };
        assert!(valid.validate().is_ok());

        let short_username = SignupRequest {
            username: "abc".to_string(),
            ..valid
        };
        assert!(short_username.validate().is_err());
    }

    #[test]
    fn test_signup_rejects_bad_email_and_short_password() {
        let request = SignupRequest {
            username: "demo-user".to_string(),
            email: "not-an-email".to_string(),
            password: "12345".to_string(),
            first_name: "Demo".to_string(),
            last_name: "User".to_string(),
        };
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_session_cookie_attributes() {
        let config = Config::default_for_test();
        let cookie = session_cookie(&config, "abc".to_string());
        assert_eq!(cookie.name(), "token");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }
}
