//! Live Events and Attendance
//!
//! Mounted under `/api/groups/{id}/live-events`.

pub mod handlers;
mod queries;
pub mod types;

use axum::routing::{delete, get};
use axum::Router;

use crate::api::AppState;

/// Create the live event router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_events).post(handlers::create_event))
        .route(
            "/{event_id}",
            get(handlers::get_event)
                .put(handlers::update_event)
                .delete(handlers::delete_event),
        )
        .route(
            "/{event_id}/attendance",
            get(handlers::list_attendance).post(handlers::create_attendance),
        )
        .route(
            "/{event_id}/attendance/{attendance_id}",
            delete(handlers::delete_attendance),
        )
}
