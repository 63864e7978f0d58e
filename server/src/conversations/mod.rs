//! Direct-Message Conversations
//!
//! Mounted under `/api/conversations`.

pub mod handlers;
mod queries;
pub mod types;

use axum::routing::{get, post, put};
use axum::Router;

use crate::api::AppState;

/// Create the conversation router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_conversations).post(handlers::create_conversation),
        )
        .route(
            "/{id}",
            get(handlers::get_conversation).delete(handlers::delete_conversation),
        )
        .route("/{id}/messages", post(handlers::create_message))
        .route("/messages/{id}", put(handlers::update_message))
        .route("/messages/{id}/delete", put(handlers::delete_message))
}
