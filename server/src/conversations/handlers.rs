//! Conversation and Message Handlers
//!
//! Conversations live outside any group: only the two participants may
//! read or write them.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::PgConnection;
use validator::Validate;

use super::queries;
use super::types::{ConversationDetail, CreateConversationRequest, MessageRequest};
use crate::api::AppState;
use crate::auth::{AuthUser, Principal};
use crate::db::{Conversation, Id, Message, DELETED_MESSAGE_TOMBSTONE};
use crate::error::{ApiError, ApiResult};
use crate::permissions::{
    decide_conversation, ConversationAction, PermissionError, ResourceKind, ResourceStore,
};

const ALREADY_EXISTS: &str = "Conversation already exists";

/// Check that `user_id` may rewrite `message` to `content`.
fn check_rewrite(message: &Message, user_id: Id, content: &str) -> ApiResult<()> {
    if message.user_id != user_id {
        return Err(PermissionError::NotAuthor.into());
    }
    if message.is_deleted() {
        return Err(ApiError::Validation(
            "Deleted messages cannot be changed".to_string(),
        ));
    }
    if message.content == content {
        return Err(ApiError::Validation(
            "Message content is unchanged".to_string(),
        ));
    }
    Ok(())
}

/// Load a conversation the caller takes part in.
async fn load_conversation(
    conn: &mut PgConnection,
    principal: Principal,
    conversation_id: Id,
    action: ConversationAction,
    lock: bool,
) -> ApiResult<Conversation> {
    let found = if lock {
        queries::lock_conversation(conn, conversation_id).await?
    } else {
        queries::find_conversation(conn, conversation_id).await?
    };
    let conversation = found.ok_or(PermissionError::NotFound(ResourceKind::Conversation))?;

    decide_conversation(principal, &conversation, action).require()?;
    Ok(conversation)
}

/// Lock a message after checking the caller takes part in its conversation.
async fn lock_message(conn: &mut PgConnection, principal: Principal, message_id: Id) -> ApiResult<Message> {
    let message = queries::lock_message(conn, message_id)
        .await?
        .ok_or(PermissionError::NotFound(ResourceKind::Message))?;
    load_conversation(
        conn,
        principal,
        message.conversation_id,
        ConversationAction::Post,
        false,
    )
    .await?;
    Ok(message)
}

/// GET /api/conversations
#[tracing::instrument(skip(state))]
pub async fn list_conversations(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<Conversation>>> {
    Ok(Json(queries::list_conversations(&state.db, auth.id).await?))
}

/// Start a conversation with another user.
///
/// POST /api/conversations
#[tracing::instrument(skip(state, body))]
pub async fn create_conversation(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateConversationRequest>,
) -> ApiResult<(StatusCode, Json<Conversation>)> {
    if body.user_id == auth.id {
        return Err(ApiError::Validation(
            "Cannot start a conversation with yourself".to_string(),
        ));
    }

    let mut tx = state.db.begin().await?;
    if !tx.user_exists(body.user_id).await? {
        return Err(PermissionError::NotFound(ResourceKind::User).into());
    }

    // Both directions are checked; the unique pair index covers the race
    if tx.find_conversation_between(auth.id, body.user_id).await?.is_some() {
        return Err(ApiError::AlreadyExists(ALREADY_EXISTS.to_string()));
    }
    let conversation = tx
        .insert_conversation(auth.id, body.user_id)
        .await?
        .ok_or_else(|| ApiError::AlreadyExists(ALREADY_EXISTS.to_string()))?;
    tx.commit().await?;

    tracing::info!(
        conversation_id = conversation.id,
        user_id = auth.id,
        invited_id = body.user_id,
        "Conversation started"
    );
    Ok((StatusCode::CREATED, Json(conversation)))
}

/// GET /api/conversations/{id}
#[tracing::instrument(skip(state))]
pub async fn get_conversation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(conversation_id): Path<Id>,
) -> ApiResult<Json<ConversationDetail>> {
    let mut conn = state.db.acquire().await?;
    let conversation = load_conversation(
        &mut conn,
        auth.into(),
        conversation_id,
        ConversationAction::Read,
        false,
    )
    .await?;
    let messages = queries::list_messages(&mut conn, conversation.id).await?;

    Ok(Json(ConversationDetail {
        conversation,
        messages,
    }))
}

/// Delete a conversation and all of its messages.
///
/// DELETE /api/conversations/{id}
#[tracing::instrument(skip(state))]
pub async fn delete_conversation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(conversation_id): Path<Id>,
) -> ApiResult<StatusCode> {
    let mut tx = state.db.begin().await?;
    let conversation = load_conversation(
        &mut tx,
        auth.into(),
        conversation_id,
        ConversationAction::Delete,
        true,
    )
    .await?;

    queries::delete_conversation(&mut tx, conversation.id).await?;
    tx.commit().await?;

    tracing::info!(conversation_id, user_id = auth.id, "Conversation deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/conversations/{id}/messages
#[tracing::instrument(skip(state, body))]
pub async fn create_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(conversation_id): Path<Id>,
    Json(body): Json<MessageRequest>,
) -> ApiResult<(StatusCode, Json<Message>)> {
    body.validate()?;

    let mut tx = state.db.begin().await?;
    let conversation = load_conversation(
        &mut tx,
        auth.into(),
        conversation_id,
        ConversationAction::Post,
        true,
    )
    .await?;

    let message = queries::create_message(&mut tx, conversation.id, auth.id, &body.content).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(message)))
}

/// Edit a message. The old content is kept as `previousContent`.
///
/// PUT /api/conversations/messages/{id}
#[tracing::instrument(skip(state, body))]
pub async fn update_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(message_id): Path<Id>,
    Json(body): Json<MessageRequest>,
) -> ApiResult<Json<Message>> {
    body.validate()?;

    let mut tx = state.db.begin().await?;
    let message = lock_message(&mut tx, auth.into(), message_id).await?;
    check_rewrite(&message, auth.id, &body.content)?;

    let message =
        queries::rewrite_message(&mut tx, message.id, &body.content, &message.content).await?;
    tx.commit().await?;

    Ok(Json(message))
}

/// Soft-delete a message by replacing its content with a tombstone.
///
/// PUT /api/conversations/messages/{id}/delete
#[tracing::instrument(skip(state))]
pub async fn delete_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(message_id): Path<Id>,
) -> ApiResult<Json<Message>> {
    let mut tx = state.db.begin().await?;
    let message = lock_message(&mut tx, auth.into(), message_id).await?;
    check_rewrite(&message, auth.id, DELETED_MESSAGE_TOMBSTONE)?;

    let message =
        queries::rewrite_message(&mut tx, message.id, DELETED_MESSAGE_TOMBSTONE, &message.content)
            .await?;
    tx.commit().await?;

    Ok(Json(message))
}
