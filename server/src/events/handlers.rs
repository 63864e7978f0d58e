//! Live Event and Attendance Handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::PgConnection;
use validator::Validate;

use super::queries;
use super::types::{
    CreateAttendanceRequest, CreateLiveEventRequest, LiveEventView, UpdateLiveEventRequest,
};
use crate::api::AppState;
use crate::auth::{AuthUser, Principal};
use crate::db::{Attendance, Id, LiveEvent};
use crate::error::{ApiError, ApiResult};
use crate::permissions::{
    authorize_group, authorize_live_event, decide_attendance, decide_remove_attendance,
    decide_view_event, filter_list, generate_invitation_token, GroupAccess, GroupAction,
    GroupRole, LiveEventListing, OwnedAction, PermissionError, ResourceKind, ResourceStore,
};

/// Creator and elevated roles see the private invitation.
fn reveals_invitation(access: &GroupAccess, event: &LiveEvent) -> bool {
    access.principal.is(event.creator_id) || access.role().is_elevated()
}

/// Whether the caller has an RSVP for `event`.
async fn attends(
    conn: &mut PgConnection,
    access: &GroupAccess,
    event: &LiveEvent,
) -> ApiResult<bool> {
    Ok(match access.principal.user_id() {
        Some(user_id) => queries::is_attending(conn, event.id, user_id).await?,
        None => false,
    })
}

/// A private event the caller may not read answers `NotFound` on every route.
async fn require_event_visible(
    conn: &mut PgConnection,
    access: &GroupAccess,
    event: &LiveEvent,
) -> ApiResult<()> {
    let attending = attends(conn, access, event).await?;
    decide_view_event(access.principal, &access.facts(), event, attending).require()?;
    Ok(())
}

/// GET /api/groups/{id}/live-events
#[tracing::instrument(skip(state))]
pub async fn list_events(
    State(state): State<AppState>,
    principal: Principal,
    Path(group_id): Path<Id>,
) -> ApiResult<Json<Vec<LiveEventView>>> {
    let mut conn = state.db.acquire().await?;
    let access = authorize_group(&mut *conn, principal, group_id, GroupAction::ViewContent).await?;

    let events = queries::list_events(&mut conn, group_id).await?;
    let rule = LiveEventListing {
        role: access.role(),
    };

    Ok(Json(
        filter_list(principal, events, &rule)
            .into_iter()
            .map(|event| {
                let reveal = reveals_invitation(&access, &event);
                LiveEventView::new(event, reveal)
            })
            .collect(),
    ))
}

/// POST /api/groups/{id}/live-events
#[tracing::instrument(skip(state, body))]
pub async fn create_event(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<Id>,
    Json(body): Json<CreateLiveEventRequest>,
) -> ApiResult<(StatusCode, Json<LiveEventView>)> {
    body.validate()?;

    let mut tx = state.db.begin().await?;
    authorize_group(&mut *tx, auth.into(), group_id, GroupAction::Contribute).await?;

    let token = generate_invitation_token();
    let event = queries::create_event(&mut tx, group_id, auth.id, &body, &token).await?;
    tx.commit().await?;

    tracing::info!(group_id, event_id = event.id, private = event.private, "Live event created");
    Ok((StatusCode::CREATED, Json(LiveEventView::new(event, true))))
}

/// GET /api/groups/{id}/live-events/{event_id}
#[tracing::instrument(skip(state))]
pub async fn get_event(
    State(state): State<AppState>,
    principal: Principal,
    Path((group_id, event_id)): Path<(Id, Id)>,
) -> ApiResult<Json<LiveEventView>> {
    let mut conn = state.db.acquire().await?;
    let (access, event) = authorize_live_event(
        &mut *conn,
        principal,
        group_id,
        event_id,
        GroupAction::ViewContent,
    )
    .await?;

    require_event_visible(&mut conn, &access, &event).await?;

    let reveal = reveals_invitation(&access, &event);
    Ok(Json(LiveEventView::new(event, reveal)))
}

/// PUT /api/groups/{id}/live-events/{event_id}
#[tracing::instrument(skip(state, body))]
pub async fn update_event(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((group_id, event_id)): Path<(Id, Id)>,
    Json(body): Json<UpdateLiveEventRequest>,
) -> ApiResult<Json<LiveEventView>> {
    body.validate()?;

    let mut tx = state.db.begin().await?;
    let (access, event) = authorize_live_event(
        &mut *tx,
        auth.into(),
        group_id,
        event_id,
        GroupAction::ViewContent,
    )
    .await?;
    require_event_visible(&mut tx, &access, &event).await?;
    access.require_owned(event.creator_id, OwnedAction::Manage)?;

    let event = queries::update_event(&mut tx, event.id, body).await?;
    tx.commit().await?;

    Ok(Json(LiveEventView::new(event, true)))
}

/// DELETE /api/groups/{id}/live-events/{event_id}
#[tracing::instrument(skip(state))]
pub async fn delete_event(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((group_id, event_id)): Path<(Id, Id)>,
) -> ApiResult<StatusCode> {
    let mut tx = state.db.begin().await?;
    let (access, event) = authorize_live_event(
        &mut *tx,
        auth.into(),
        group_id,
        event_id,
        GroupAction::ViewContent,
    )
    .await?;
    require_event_visible(&mut tx, &access, &event).await?;
    access.require_owned(event.creator_id, OwnedAction::Delete)?;

    queries::delete_event(&mut tx, event.id).await?;
    tx.commit().await?;

    tracing::info!(group_id, event_id, "Live event deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Attendance
// ============================================================================

/// GET .../live-events/{event_id}/attendance
#[tracing::instrument(skip(state))]
pub async fn list_attendance(
    State(state): State<AppState>,
    principal: Principal,
    Path((group_id, event_id)): Path<(Id, Id)>,
) -> ApiResult<Json<Vec<Attendance>>> {
    let mut conn = state.db.acquire().await?;
    let (access, event) = authorize_live_event(
        &mut *conn,
        principal,
        group_id,
        event_id,
        GroupAction::ViewContent,
    )
    .await?;

    require_event_visible(&mut conn, &access, &event).await?;

    Ok(Json(queries::list_attendance(&mut conn, event.id).await?))
}

/// RSVP, for oneself or (as creator or elevated role) for another member.
///
/// POST .../live-events/{event_id}/attendance
#[tracing::instrument(skip(state, body))]
pub async fn create_attendance(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((group_id, event_id)): Path<(Id, Id)>,
    body: Option<Json<CreateAttendanceRequest>>,
) -> ApiResult<(StatusCode, Json<Attendance>)> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    body.validate()?;

    let mut tx = state.db.begin().await?;
    let (access, event) = authorize_live_event(
        &mut *tx,
        auth.into(),
        group_id,
        event_id,
        GroupAction::ViewContent,
    )
    .await?;

    let attending = attends(&mut tx, &access, &event).await?;
    let target = body.invited_user_id.unwrap_or(auth.id);
    let grant = decide_attendance(
        auth.into(),
        &access.facts(),
        &event,
        attending,
        target,
        body.invitation.as_deref(),
    )?;

    if target != auth.id {
        let target_role = match tx.find_membership(group_id, target).await? {
            Some(m) => GroupRole::from_status(m.status),
            None if target == access.group.organizer_id => GroupRole::Organizer,
            None => GroupRole::Outsider,
        };
        if !target_role.is_approved() {
            return Err(ApiError::Validation(
                "Invited user is not a member of this group".to_string(),
            ));
        }
    }

    let attendance = queries::create_attendance(&mut tx, event.id, target, &event.private_invitation)
        .await?
        .ok_or_else(|| {
            ApiError::AlreadyExists("User is already attending this live event".to_string())
        })?;
    tx.commit().await?;

    tracing::info!(event_id, user_id = target, ?grant, "Attendance recorded");
    Ok((StatusCode::CREATED, Json(attendance)))
}

/// Cancel an RSVP (attendee, event creator or elevated role).
///
/// DELETE .../live-events/{event_id}/attendance/{attendance_id}
#[tracing::instrument(skip(state))]
pub async fn delete_attendance(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((group_id, event_id, attendance_id)): Path<(Id, Id, Id)>,
) -> ApiResult<StatusCode> {
    let mut tx = state.db.begin().await?;
    let (access, event) = authorize_live_event(
        &mut *tx,
        auth.into(),
        group_id,
        event_id,
        GroupAction::ViewContent,
    )
    .await?;
    require_event_visible(&mut tx, &access, &event).await?;

    let attendance = queries::find_attendance(&mut tx, event.id, attendance_id)
        .await?
        .ok_or(PermissionError::NotFound(ResourceKind::Attendance))?;
    decide_remove_attendance(auth.into(), &access.facts(), &event, attendance.user_id).require()?;

    queries::delete_attendance(&mut tx, attendance.id).await?;
    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}
