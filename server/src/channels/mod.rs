//! Channels, Chats, Replies and Photos
//!
//! Mounted under `/api/groups/{id}/channels`.

pub mod chats;
pub mod handlers;
mod queries;
pub mod types;

use axum::routing::{delete, get, put};
use axum::Router;

use crate::api::AppState;

/// Create the channel router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_channels).post(handlers::create_channel),
        )
        .route(
            "/{channel_id}",
            get(handlers::get_channel)
                .put(handlers::update_channel)
                .delete(handlers::delete_channel),
        )
        // Chats
        .route(
            "/{channel_id}/chats",
            get(chats::list_chats).post(chats::create_chat),
        )
        .route(
            "/{channel_id}/chats/{chat_id}",
            put(chats::update_chat).delete(chats::delete_chat),
        )
        // Replies
        .route(
            "/{channel_id}/chats/{chat_id}/replies",
            get(chats::list_replies).post(chats::create_reply),
        )
        .route(
            "/{channel_id}/chats/{chat_id}/replies/{reply_id}",
            put(chats::update_reply).delete(chats::delete_reply),
        )
        // Photos
        .route(
            "/{channel_id}/chats/{chat_id}/photos",
            get(chats::list_photos).post(chats::create_photo),
        )
        .route(
            "/{channel_id}/chats/{chat_id}/photos/{photo_id}",
            delete(chats::delete_photo),
        )
}
