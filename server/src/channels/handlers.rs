//! Channel Handlers
//!
//! Reading needs group membership of any status; creating, editing and
//! deleting channels needs an elevated role.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use validator::Validate;

use super::queries;
use super::types::{CreateChannelRequest, UpdateChannelRequest};
use crate::api::AppState;
use crate::auth::{AuthUser, Principal};
use crate::db::{Channel, Id};
use crate::error::ApiResult;
use crate::permissions::{authorize_channel, authorize_group, GroupAction};

/// GET /api/groups/{id}/channels
#[tracing::instrument(skip(state))]
pub async fn list_channels(
    State(state): State<AppState>,
    principal: Principal,
    Path(group_id): Path<Id>,
) -> ApiResult<Json<Vec<Channel>>> {
    let mut conn = state.db.acquire().await?;
    authorize_group(&mut *conn, principal, group_id, GroupAction::ViewContent).await?;

    Ok(Json(queries::list_channels(&mut conn, group_id).await?))
}

/// POST /api/groups/{id}/channels
#[tracing::instrument(skip(state, body))]
pub async fn create_channel(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<Id>,
    Json(body): Json<CreateChannelRequest>,
) -> ApiResult<(StatusCode, Json<Channel>)> {
    body.validate()?;

    let mut tx = state.db.begin().await?;
    authorize_group(&mut *tx, auth.into(), group_id, GroupAction::ManageChannels).await?;
    let channel = queries::create_channel(&mut tx, group_id, auth.id, &body).await?;
    tx.commit().await?;

    tracing::info!(group_id, channel_id = channel.id, "Channel created");
    Ok((StatusCode::CREATED, Json(channel)))
}

/// GET /api/groups/{id}/channels/{channel_id}
#[tracing::instrument(skip(state))]
pub async fn get_channel(
    State(state): State<AppState>,
    principal: Principal,
    Path((group_id, channel_id)): Path<(Id, Id)>,
) -> ApiResult<Json<Channel>> {
    let mut conn = state.db.acquire().await?;
    let (_, channel) = authorize_channel(
        &mut *conn,
        principal,
        group_id,
        channel_id,
        GroupAction::ViewContent,
    )
    .await?;

    Ok(Json(channel))
}

/// PUT /api/groups/{id}/channels/{channel_id}
#[tracing::instrument(skip(state, body))]
pub async fn update_channel(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((group_id, channel_id)): Path<(Id, Id)>,
    Json(body): Json<UpdateChannelRequest>,
) -> ApiResult<Json<Channel>> {
    body.validate()?;

    let mut tx = state.db.begin().await?;
    authorize_channel(
        &mut *tx,
        auth.into(),
        group_id,
        channel_id,
        GroupAction::ManageChannels,
    )
    .await?;
    let channel = queries::update_channel(&mut tx, channel_id, body).await?;
    tx.commit().await?;

    Ok(Json(channel))
}

/// DELETE /api/groups/{id}/channels/{channel_id}
#[tracing::instrument(skip(state))]
pub async fn delete_channel(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((group_id, channel_id)): Path<(Id, Id)>,
) -> ApiResult<StatusCode> {
    let mut tx = state.db.begin().await?;
    authorize_channel(
        &mut *tx,
        auth.into(),
        group_id,
        channel_id,
        GroupAction::ManageChannels,
    )
    .await?;
    queries::delete_channel(&mut tx, channel_id).await?;
    tx.commit().await?;

    tracing::info!(group_id, channel_id, "Channel deleted");
    Ok(StatusCode::NO_CONTENT)
}
