//! Group and Membership Handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use validator::Validate;

use super::queries::{self, NewGroup};
use super::types::{
    CreateGroupRequest, GroupEntry, InvitationResponse, RedeemInvitationRequest,
    UpdateGroupRequest, UpdateMembershipRequest,
};
use crate::api::AppState;
use crate::auth::{AuthUser, Principal};
use crate::db::{GroupMembership, Id};
use crate::error::{ApiError, ApiResult};
use crate::permissions::{
    self, authorize_group, filter_list, generate_invitation_token, load_group_access,
    GroupAction, GroupListing, MemberListing, ResourceStore,
};

// ============================================================================
// Groups
// ============================================================================

/// List groups visible to the caller.
///
/// GET /api/groups
#[tracing::instrument(skip(state))]
pub async fn list_groups(
    State(state): State<AppState>,
    principal: Principal,
) -> ApiResult<Json<Vec<GroupEntry>>> {
    let groups = queries::list_groups(&state.db).await?;
    let rule = match principal.user_id() {
        Some(user_id) => GroupListing::new(queries::list_user_memberships(&state.db, user_id).await?),
        None => GroupListing::default(),
    };

    let entries = filter_list(principal, groups, &rule)
        .into_iter()
        .map(|group| GroupEntry {
            membership: rule.status_in(group.id),
            group,
        })
        .collect();

    Ok(Json(entries))
}

/// Groups the caller organizes or has joined.
///
/// GET /api/groups/current
#[tracing::instrument(skip(state))]
pub async fn list_current_groups(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<GroupEntry>>> {
    let groups = queries::list_groups_for_user(&state.db, auth.id).await?;
    let rule = GroupListing::new(queries::list_user_memberships(&state.db, auth.id).await?);

    Ok(Json(
        groups
            .into_iter()
            .map(|group| GroupEntry {
                membership: rule.status_in(group.id),
                group,
            })
            .collect(),
    ))
}

/// Create a group. The caller becomes its organizer.
///
/// POST /api/groups
#[tracing::instrument(skip(state, body), fields(name = %body.name))]
pub async fn create_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateGroupRequest>,
) -> ApiResult<(StatusCode, Json<GroupEntry>)> {
    body.validate()?;

    let invitation_code = generate_invitation_token();
    let group = queries::create_group(
        &state.db,
        NewGroup {
            organizer_id: auth.id,
            name: &body.name,
            description: &body.description,
            private: body.private,
            image_url: body.image_url.as_deref(),
            invitation_code: &invitation_code,
        },
    )
    .await?
    .ok_or_else(|| ApiError::AlreadyExists("Group name is already taken".to_string()))?;

    tracing::info!(group_id = group.id, organizer_id = auth.id, "Group created");

    Ok((
        StatusCode::CREATED,
        Json(GroupEntry {
            group,
            membership: None,
        }),
    ))
}

/// Get one group.
///
/// Missing groups are 404 for everyone; private groups are 403 for outsiders.
///
/// GET /api/groups/{id}
#[tracing::instrument(skip(state))]
pub async fn get_group(
    State(state): State<AppState>,
    principal: Principal,
    Path(group_id): Path<Id>,
) -> ApiResult<Json<GroupEntry>> {
    let mut conn = state.db.acquire().await?;
    let access = authorize_group(&mut *conn, principal, group_id, GroupAction::ViewGroup).await?;

    Ok(Json(GroupEntry {
        membership: access.membership.as_ref().map(|m| m.status),
        group: access.group,
    }))
}

/// Update a group (organizer only).
///
/// PUT /api/groups/{id}
#[tracing::instrument(skip(state, body))]
pub async fn update_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<Id>,
    Json(body): Json<UpdateGroupRequest>,
) -> ApiResult<Json<GroupEntry>> {
    body.validate()?;

    let mut tx = state.db.begin().await?;
    let access =
        authorize_group(&mut *tx, auth.into(), group_id, GroupAction::UpdateGroup).await?;

    let group = queries::update_group(&mut tx, group_id, body)
        .await?
        .ok_or_else(|| ApiError::AlreadyExists("Group name is already taken".to_string()))?;
    tx.commit().await?;

    Ok(Json(GroupEntry {
        group,
        membership: access.membership.map(|m| m.status),
    }))
}

/// Delete a group and everything in it (organizer only).
///
/// DELETE /api/groups/{id}
#[tracing::instrument(skip(state))]
pub async fn delete_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<Id>,
) -> ApiResult<StatusCode> {
    let mut tx = state.db.begin().await?;
    authorize_group(&mut *tx, auth.into(), group_id, GroupAction::DeleteGroup).await?;
    queries::delete_group(&mut tx, group_id).await?;
    tx.commit().await?;

    tracing::info!(group_id, "Group deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Membership
// ============================================================================

/// List memberships. Pending requests are shown to the organizer only.
///
/// GET /api/groups/{id}/members
#[tracing::instrument(skip(state))]
pub async fn list_members(
    State(state): State<AppState>,
    principal: Principal,
    Path(group_id): Path<Id>,
) -> ApiResult<Json<Vec<GroupMembership>>> {
    let mut conn = state.db.acquire().await?;
    let access = authorize_group(&mut *conn, principal, group_id, GroupAction::ViewGroup).await?;
    let memberships = conn.list_memberships(group_id).await?;

    let rule = MemberListing {
        organizer_id: access.group.organizer_id,
    };
    Ok(Json(filter_list(principal, memberships, &rule)))
}

/// Request membership. Always starts `pending`.
///
/// POST /api/groups/{id}/membership
#[tracing::instrument(skip(state))]
pub async fn request_membership(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<Id>,
) -> ApiResult<(StatusCode, Json<GroupMembership>)> {
    let mut tx = state.db.begin().await?;
    let membership = permissions::request_membership(&mut *tx, auth.id, group_id).await?;
    tx.commit().await?;

    tracing::info!(group_id, member_id = auth.id, "Membership requested");
    Ok((StatusCode::CREATED, Json(membership)))
}

/// Change a membership's status.
///
/// PUT /api/groups/{id}/membership
#[tracing::instrument(skip(state))]
pub async fn update_membership(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<Id>,
    Json(body): Json<UpdateMembershipRequest>,
) -> ApiResult<Json<GroupMembership>> {
    let mut tx = state.db.begin().await?;
    let membership = permissions::transition_membership(
        &mut *tx,
        auth.into(),
        group_id,
        body.member_id,
        body.status,
    )
    .await?;
    tx.commit().await?;

    Ok(Json(membership))
}

/// Leave a group, reject a request or remove a member.
///
/// DELETE /api/groups/{id}/membership/{member_id}
#[tracing::instrument(skip(state))]
pub async fn remove_membership(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((group_id, member_id)): Path<(Id, Id)>,
) -> ApiResult<StatusCode> {
    let mut tx = state.db.begin().await?;
    permissions::remove_membership(&mut *tx, auth.into(), group_id, member_id).await?;
    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Show the group's invitation code (organizer and co-admins).
///
/// GET /api/groups/{id}/invitation
#[tracing::instrument(skip(state))]
pub async fn get_invitation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<Id>,
) -> ApiResult<Json<InvitationResponse>> {
    let mut conn = state.db.acquire().await?;
    let access = load_group_access(&mut *conn, auth.into(), group_id).await?;
    access.require(GroupAction::ViewInvitation)?;

    Ok(Json(InvitationResponse {
        group_id,
        invitation_code: access.group.invitation_code,
    }))
}

/// Join through the group's invitation code.
///
/// POST /api/groups/{id}/invitation/redeem
#[tracing::instrument(skip(state, body))]
pub async fn redeem_invitation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<Id>,
    Json(body): Json<RedeemInvitationRequest>,
) -> ApiResult<Json<GroupMembership>> {
    body.validate()?;

    let mut tx = state.db.begin().await?;
    let membership =
        permissions::redeem_invitation(&mut *tx, auth.id, group_id, &body.code).await?;
    tx.commit().await?;

    tracing::info!(group_id, member_id = auth.id, "Invitation redeemed");
    Ok(Json(membership))
}
