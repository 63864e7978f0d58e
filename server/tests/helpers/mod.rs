//! Reusable test helpers for HTTP integration tests.
//!
//! Provides `TestApp` for building and sending requests through the full
//! axum router, plus utilities for user creation and session tokens.
//!
//! ## Cleanup Guards
//!
//! Use [`CleanupGuard`] for RAII-based cleanup that runs even if a test panics.
#![allow(dead_code)]

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{self, Method, Request, Response};
use axum::Router;
use gather_server::api::{create_router, AppState};
use gather_server::auth::jwt;
use gather_server::config::Config;
use gather_server::db::{self, Id, NewUser};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

/// Test configuration, honouring `DATABASE_URL` when set.
pub fn test_config() -> Config {
    let mut config = Config::default_for_test();
    if let Ok(url) = std::env::var("DATABASE_URL") {
        config.database_url = url;
    }
    config
}

// ============================================================================
// Cleanup Guard
// ============================================================================

/// Async cleanup action type.
type CleanupAction = Box<dyn FnOnce(PgPool) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send>;

/// RAII guard that runs cleanup actions on drop, even if the test panics.
///
/// Deleting a user cascades to everything they organized, joined or wrote.
pub struct CleanupGuard {
    pool: PgPool,
    actions: Vec<CleanupAction>,
}

impl CleanupGuard {
    /// Create a new cleanup guard for the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            actions: Vec::new(),
        }
    }

    /// Register a generic async cleanup action.
    pub fn add<F, Fut>(&mut self, action: F)
    where
        F: FnOnce(PgPool) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.actions
            .push(Box::new(move |pool| Box::pin(action(pool))));
    }

    /// Register cleanup to delete a user by ID.
    pub fn delete_user(&mut self, user_id: Id) {
        self.add(move |pool| async move {
            let _ = sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(user_id)
                .execute(&pool)
                .await;
        });
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let actions = std::mem::take(&mut self.actions);
        if actions.is_empty() {
            return;
        }

        let pool = self.pool.clone();
        let handle = tokio::runtime::Handle::current();

        // Block on a separate thread; the runtime thread cannot block itself
        std::thread::spawn(move || {
            handle.block_on(async move {
                for action in actions {
                    action(pool.clone()).await;
                }
            });
        })
        .join()
        .expect("Cleanup thread panicked");
    }
}

// ============================================================================
// Test App
// ============================================================================

/// A test application wrapping the full axum router.
pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
    pub config: Arc<Config>,
}

impl TestApp {
    /// Create a test app with a fresh pool and migrated schema.
    pub async fn new() -> Self {
        let config = test_config();
        let pool = db::create_pool(&config.database_url)
            .await
            .expect("Failed to connect to test DB");
        db::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let router = create_router(AppState::new(pool.clone(), config.clone()));

        Self {
            router,
            pool,
            config: Arc::new(config),
        }
    }

    /// Build an HTTP request with the given method and URI.
    pub fn request(method: Method, uri: &str) -> http::request::Builder {
        Request::builder().method(method).uri(uri)
    }

    /// Send a request through the router via `tower::ServiceExt::oneshot`.
    pub async fn oneshot(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot request failed")
    }

    /// Send an optionally authenticated request with an optional JSON body.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Response<Body> {
        let mut builder = Self::request(method, uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(serde_json::to_string(&json).unwrap())
            }
            None => Body::empty(),
        };
        self.oneshot(builder.body(body).unwrap()).await
    }

    /// Create a [`CleanupGuard`] for this app's pool.
    pub fn cleanup_guard(&self) -> CleanupGuard {
        CleanupGuard::new(self.pool.clone())
    }
}

// ============================================================================
// User & Auth helpers
// ============================================================================

/// Create a test user and return `(user_id, username)`.
pub async fn create_test_user(pool: &PgPool) -> (Id, String) {
    let test_id = Uuid::new_v4().simple().to_string()[..10].to_string();
    let username = format!("t_{test_id}");
    let email = format!("{username}@example.com");

    let user = db::create_user(
        pool,
        NewUser {
            username: &username,
            email: &email,
            first_name: "Test",
            last_name: "User",
            password_hash: "hash",
        },
    )
    .await
    .expect("Failed to create test user")
    .expect("Test username collided");

    (user.id, username)
}

/// Generate a session token for the given user.
pub fn generate_session_token(config: &Config, user_id: Id) -> String {
    jwt::issue_session_token(user_id, &config.jwt_secret, config.jwt_expiry)
        .expect("Failed to issue session token")
}

/// Create a user plus a session token, registering the user for cleanup.
pub async fn signed_in_user(app: &TestApp, guard: &mut CleanupGuard) -> (Id, String) {
    let (user_id, _) = create_test_user(&app.pool).await;
    guard.delete_user(user_id);
    (user_id, generate_session_token(&app.config, user_id))
}

/// Collect a response body as JSON.
pub async fn body_to_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

// ============================================================================
// Domain helpers
// ============================================================================

/// Create a group through the API and return its ID.
pub async fn create_group(app: &TestApp, token: &str, private: bool) -> Id {
    let name = format!("group {}", &Uuid::new_v4().simple().to_string()[..12]);
    let body = serde_json::json!({
        "name": name,
        "description": "A group for integration tests with a long enough description.",
        "private": private,
    });
    let resp = app
        .send(Method::POST, "/api/groups", Some(token), Some(body))
        .await;
    assert_eq!(resp.status(), 201, "Group creation should return 201");
    body_to_json(resp).await["id"].as_i64().unwrap()
}

/// Insert a membership row directly.
pub async fn add_member(pool: &PgPool, group_id: Id, member_id: Id, status: &str) {
    sqlx::query(
        r"
        INSERT INTO group_memberships (group_id, member_id, status, invitation)
        VALUES ($1, $2, $3::membership_status, 'TESTINVITATION00')
        ",
    )
    .bind(group_id)
    .bind(member_id)
    .bind(status)
    .execute(pool)
    .await
    .expect("Failed to add membership");
}
