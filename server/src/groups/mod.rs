//! Groups and Membership
//!
//! Group CRUD plus the membership lifecycle routes.

pub mod handlers;
mod queries;
pub mod types;

use axum::routing::{delete, get, post};
use axum::Router;

use crate::api::AppState;

/// Create the group router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_groups).post(handlers::create_group))
        .route("/current", get(handlers::list_current_groups))
        .route(
            "/{id}",
            get(handlers::get_group)
                .put(handlers::update_group)
                .delete(handlers::delete_group),
        )
        .route("/{id}/members", get(handlers::list_members))
        .route(
            "/{id}/membership",
            post(handlers::request_membership).put(handlers::update_membership),
        )
        .route(
            "/{id}/membership/{member_id}",
            delete(handlers::remove_membership),
        )
        .route("/{id}/invitation", get(handlers::get_invitation))
        .route(
            "/{id}/invitation/redeem",
            post(handlers::redeem_invitation),
        )
}
