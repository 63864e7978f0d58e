//! API Router and Application State
//!
//! Central routing configuration and shared state.

use axum::{
    extract::State, middleware::from_fn_with_state, routing::get, Json, Router,
};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{auth, channels, config::Config, conversations, events, groups};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,
    /// Server configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}

/// Create the main application router.
///
/// Every route sees a resolved [`auth::Principal`]; handlers that need a
/// signed-in user extract [`auth::AuthUser`] instead.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .merge(auth::router())
        .nest("/groups", groups::router())
        .nest("/groups/{id}/channels", channels::router())
        .nest("/groups/{id}/live-events", events::router())
        .nest("/conversations", conversations::router());

    Router::new()
        // Health check
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        // Middleware
        .layer(from_fn_with_state(state.clone(), auth::resolve_principal))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        // State
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    /// Service status
    status: &'static str,
    /// Whether the database answered
    database: bool,
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = sqlx::query("SELECT 1").execute(&state.db).await.is_ok();
    Json(HealthResponse {
        status: if database { "ok" } else { "degraded" },
        database,
    })
}
