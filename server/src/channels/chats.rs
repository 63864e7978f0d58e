//! Chat, Reply and Photo Handlers
//!
//! Posting needs an approved membership. Editing text is author-only;
//! hiding and deleting is open to the author and to moderators.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::PgConnection;
use validator::Validate;

use super::queries;
use super::types::{CreateChatRequest, CreatePhotoRequest, UpdateChatRequest};
use crate::api::AppState;
use crate::auth::{AuthUser, Principal};
use crate::db::{ChannelChat, ChannelChatPhoto, ChannelChatReply, Id};
use crate::error::ApiResult;
use crate::permissions::{
    authorize_channel, filter_list, GroupAccess, GroupAction, HiddenContent, OwnedAction,
    PermissionError, ResourceKind, VisibilityRule,
};

/// Whether the caller may see this item: visible, their own, or moderated
/// by them.
fn can_see<T>(access: &GroupAccess, item: &T) -> bool
where
    HiddenContent: VisibilityRule<T>,
{
    HiddenContent.is_visible(access.principal, item)
        || access.decide(GroupAction::Moderate).is_allowed()
}

/// Load a chat of the channel, hiding it from callers who may not see it.
async fn load_chat(
    conn: &mut PgConnection,
    access: &GroupAccess,
    channel_id: Id,
    chat_id: Id,
) -> ApiResult<ChannelChat> {
    queries::lock_chat(conn, channel_id, chat_id)
        .await?
        .filter(|chat| can_see(access, chat))
        .ok_or_else(|| PermissionError::NotFound(ResourceKind::ChannelChat).into())
}

async fn load_reply(
    conn: &mut PgConnection,
    access: &GroupAccess,
    chat_id: Id,
    reply_id: Id,
) -> ApiResult<ChannelChatReply> {
    queries::lock_reply(conn, chat_id, reply_id)
        .await?
        .filter(|reply| can_see(access, reply))
        .ok_or_else(|| PermissionError::NotFound(ResourceKind::ChannelChatReply).into())
}

/// Check the edit against the author and moderation grants.
fn require_edit(access: &GroupAccess, author_id: Id, body: &UpdateChatRequest) -> ApiResult<()> {
    if body.body.is_some() {
        access.require_owned(author_id, OwnedAction::Edit)?;
    }
    if body.visible.is_some() {
        access.require_owned(author_id, OwnedAction::Manage)?;
    }
    Ok(())
}

// ============================================================================
// Chats
// ============================================================================

/// GET /api/groups/{id}/channels/{channel_id}/chats
#[tracing::instrument(skip(state))]
pub async fn list_chats(
    State(state): State<AppState>,
    principal: Principal,
    Path((group_id, channel_id)): Path<(Id, Id)>,
) -> ApiResult<Json<Vec<ChannelChat>>> {
    let mut conn = state.db.acquire().await?;
    authorize_channel(
        &mut *conn,
        principal,
        group_id,
        channel_id,
        GroupAction::ViewContent,
    )
    .await?;

    let chats = queries::list_chats(&mut conn, channel_id).await?;
    Ok(Json(filter_list(principal, chats, &HiddenContent)))
}

/// POST /api/groups/{id}/channels/{channel_id}/chats
#[tracing::instrument(skip(state, body))]
pub async fn create_chat(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((group_id, channel_id)): Path<(Id, Id)>,
    Json(body): Json<CreateChatRequest>,
) -> ApiResult<(StatusCode, Json<ChannelChat>)> {
    body.validate()?;

    let mut tx = state.db.begin().await?;
    authorize_channel(
        &mut *tx,
        auth.into(),
        group_id,
        channel_id,
        GroupAction::Contribute,
    )
    .await?;
    let chat = queries::create_chat(&mut tx, channel_id, auth.id, &body.body).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(chat)))
}

/// PUT /api/groups/{id}/channels/{channel_id}/chats/{chat_id}
#[tracing::instrument(skip(state, body))]
pub async fn update_chat(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((group_id, channel_id, chat_id)): Path<(Id, Id, Id)>,
    Json(body): Json<UpdateChatRequest>,
) -> ApiResult<Json<ChannelChat>> {
    body.validate()?;

    let mut tx = state.db.begin().await?;
    let (access, _) = authorize_channel(
        &mut *tx,
        auth.into(),
        group_id,
        channel_id,
        GroupAction::ViewContent,
    )
    .await?;
    let chat = load_chat(&mut tx, &access, channel_id, chat_id).await?;
    require_edit(&access, chat.user_id, &body)?;

    let chat = queries::update_chat(&mut tx, chat.id, body).await?;
    tx.commit().await?;

    Ok(Json(chat))
}

/// DELETE /api/groups/{id}/channels/{channel_id}/chats/{chat_id}
#[tracing::instrument(skip(state))]
pub async fn delete_chat(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((group_id, channel_id, chat_id)): Path<(Id, Id, Id)>,
) -> ApiResult<StatusCode> {
    let mut tx = state.db.begin().await?;
    let (access, _) = authorize_channel(
        &mut *tx,
        auth.into(),
        group_id,
        channel_id,
        GroupAction::ViewContent,
    )
    .await?;
    let chat = load_chat(&mut tx, &access, channel_id, chat_id).await?;
    access.require_owned(chat.user_id, OwnedAction::Delete)?;

    queries::delete_chat(&mut tx, chat.id).await?;
    tx.commit().await?;

    tracing::info!(chat_id, deleted_by = auth.id, author_id = chat.user_id, "Chat deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Replies
// ============================================================================

/// GET .../chats/{chat_id}/replies
#[tracing::instrument(skip(state))]
pub async fn list_replies(
    State(state): State<AppState>,
    principal: Principal,
    Path((group_id, channel_id, chat_id)): Path<(Id, Id, Id)>,
) -> ApiResult<Json<Vec<ChannelChatReply>>> {
    let mut conn = state.db.acquire().await?;
    let (access, _) = authorize_channel(
        &mut *conn,
        principal,
        group_id,
        channel_id,
        GroupAction::ViewContent,
    )
    .await?;
    let chat = load_chat(&mut conn, &access, channel_id, chat_id).await?;

    let replies = queries::list_replies(&mut conn, chat.id).await?;
    Ok(Json(filter_list(principal, replies, &HiddenContent)))
}

/// POST .../chats/{chat_id}/replies
#[tracing::instrument(skip(state, body))]
pub async fn create_reply(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((group_id, channel_id, chat_id)): Path<(Id, Id, Id)>,
    Json(body): Json<CreateChatRequest>,
) -> ApiResult<(StatusCode, Json<ChannelChatReply>)> {
    body.validate()?;

    let mut tx = state.db.begin().await?;
    let (access, _) = authorize_channel(
        &mut *tx,
        auth.into(),
        group_id,
        channel_id,
        GroupAction::Contribute,
    )
    .await?;
    let chat = load_chat(&mut tx, &access, channel_id, chat_id).await?;
    let reply = queries::create_reply(&mut tx, chat.id, auth.id, &body.body).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(reply)))
}

/// PUT .../chats/{chat_id}/replies/{reply_id}
#[tracing::instrument(skip(state, body))]
pub async fn update_reply(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((group_id, channel_id, chat_id, reply_id)): Path<(Id, Id, Id, Id)>,
    Json(body): Json<UpdateChatRequest>,
) -> ApiResult<Json<ChannelChatReply>> {
    body.validate()?;

    let mut tx = state.db.begin().await?;
    let (access, _) = authorize_channel(
        &mut *tx,
        auth.into(),
        group_id,
        channel_id,
        GroupAction::ViewContent,
    )
    .await?;
    let chat = load_chat(&mut tx, &access, channel_id, chat_id).await?;
    let reply = load_reply(&mut tx, &access, chat.id, reply_id).await?;
    require_edit(&access, reply.user_id, &body)?;

    let reply = queries::update_reply(&mut tx, reply.id, body).await?;
    tx.commit().await?;

    Ok(Json(reply))
}

/// DELETE .../chats/{chat_id}/replies/{reply_id}
#[tracing::instrument(skip(state))]
pub async fn delete_reply(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((group_id, channel_id, chat_id, reply_id)): Path<(Id, Id, Id, Id)>,
) -> ApiResult<StatusCode> {
    let mut tx = state.db.begin().await?;
    let (access, _) = authorize_channel(
        &mut *tx,
        auth.into(),
        group_id,
        channel_id,
        GroupAction::ViewContent,
    )
    .await?;
    let chat = load_chat(&mut tx, &access, channel_id, chat_id).await?;
    let reply = load_reply(&mut tx, &access, chat.id, reply_id).await?;
    access.require_owned(reply.user_id, OwnedAction::Delete)?;

    queries::delete_reply(&mut tx, reply.id).await?;
    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Photos
// ============================================================================

/// GET .../chats/{chat_id}/photos
#[tracing::instrument(skip(state))]
pub async fn list_photos(
    State(state): State<AppState>,
    principal: Principal,
    Path((group_id, channel_id, chat_id)): Path<(Id, Id, Id)>,
) -> ApiResult<Json<Vec<ChannelChatPhoto>>> {
    let mut conn = state.db.acquire().await?;
    let (access, _) = authorize_channel(
        &mut *conn,
        principal,
        group_id,
        channel_id,
        GroupAction::ViewContent,
    )
    .await?;
    let chat = load_chat(&mut conn, &access, channel_id, chat_id).await?;

    Ok(Json(queries::list_photos(&mut conn, chat.id).await?))
}

/// Attach a photo (image URL) to a chat.
///
/// POST .../chats/{chat_id}/photos
#[tracing::instrument(skip(state, body))]
pub async fn create_photo(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((group_id, channel_id, chat_id)): Path<(Id, Id, Id)>,
    Json(body): Json<CreatePhotoRequest>,
) -> ApiResult<(StatusCode, Json<ChannelChatPhoto>)> {
    body.validate()?;

    let mut tx = state.db.begin().await?;
    let (access, _) = authorize_channel(
        &mut *tx,
        auth.into(),
        group_id,
        channel_id,
        GroupAction::Contribute,
    )
    .await?;
    let chat = load_chat(&mut tx, &access, channel_id, chat_id).await?;
    let photo = queries::create_photo(&mut tx, chat.id, auth.id, &body.image_url).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(photo)))
}

/// DELETE .../chats/{chat_id}/photos/{photo_id}
#[tracing::instrument(skip(state))]
pub async fn delete_photo(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((group_id, channel_id, chat_id, photo_id)): Path<(Id, Id, Id, Id)>,
) -> ApiResult<StatusCode> {
    let mut tx = state.db.begin().await?;
    let (access, _) = authorize_channel(
        &mut *tx,
        auth.into(),
        group_id,
        channel_id,
        GroupAction::ViewContent,
    )
    .await?;
    let chat = load_chat(&mut tx, &access, channel_id, chat_id).await?;
    let photo = queries::find_photo(&mut tx, chat.id, photo_id)
        .await?
        .ok_or(PermissionError::NotFound(ResourceKind::ChannelChatPhoto))?;
    access.require_owned(photo.user_id, OwnedAction::Delete)?;

    queries::delete_photo(&mut tx, photo.id).await?;
    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}
