//! Channel, Chat, Reply and Photo Queries
//!
//! Child lookups are always scoped to their parent so an id from another
//! channel or chat never resolves.

use sqlx::{PgConnection, QueryBuilder};

use super::types::{CreateChannelRequest, UpdateChannelRequest, UpdateChatRequest};
use crate::db::{Channel, ChannelChat, ChannelChatPhoto, ChannelChatReply, Id};

// ============================================================================
// Channels
// ============================================================================

pub async fn list_channels(conn: &mut PgConnection, group_id: Id) -> sqlx::Result<Vec<Channel>> {
    sqlx::query_as::<_, Channel>("SELECT * FROM channels WHERE group_id = $1 ORDER BY id")
        .bind(group_id)
        .fetch_all(conn)
        .await
}

pub async fn create_channel(
    conn: &mut PgConnection,
    group_id: Id,
    creator_id: Id,
    body: &CreateChannelRequest,
) -> sqlx::Result<Channel> {
    sqlx::query_as::<_, Channel>(
        r"
        INSERT INTO channels (group_id, creator_id, name, channel_type, private)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        ",
    )
    .bind(group_id)
    .bind(creator_id)
    .bind(&body.name)
    .bind(body.channel_type)
    .bind(body.private)
    .fetch_one(conn)
    .await
}

pub async fn update_channel(
    conn: &mut PgConnection,
    channel_id: Id,
    body: UpdateChannelRequest,
) -> sqlx::Result<Channel> {
    let mut builder = QueryBuilder::new("UPDATE channels SET updated_at = NOW()");
    if let Some(name) = body.name {
        builder.push(", name = ").push_bind(name);
    }
    if let Some(channel_type) = body.channel_type {
        builder.push(", channel_type = ").push_bind(channel_type);
    }
    if let Some(private) = body.private {
        builder.push(", private = ").push_bind(private);
    }
    builder.push(" WHERE id = ").push_bind(channel_id);
    builder.push(" RETURNING *");

    builder.build_query_as::<Channel>().fetch_one(conn).await
}

pub async fn delete_channel(conn: &mut PgConnection, channel_id: Id) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM channels WHERE id = $1")
        .bind(channel_id)
        .execute(conn)
        .await?;
    Ok(())
}

// ============================================================================
// Chats
// ============================================================================

pub async fn list_chats(conn: &mut PgConnection, channel_id: Id) -> sqlx::Result<Vec<ChannelChat>> {
    sqlx::query_as::<_, ChannelChat>(
        "SELECT * FROM channel_chats WHERE channel_id = $1 ORDER BY created_at, id",
    )
    .bind(channel_id)
    .fetch_all(conn)
    .await
}

/// Chat in a channel, row-locked for the rest of the transaction.
pub async fn lock_chat(
    conn: &mut PgConnection,
    channel_id: Id,
    chat_id: Id,
) -> sqlx::Result<Option<ChannelChat>> {
    sqlx::query_as::<_, ChannelChat>(
        "SELECT * FROM channel_chats WHERE id = $1 AND channel_id = $2 FOR UPDATE",
    )
    .bind(chat_id)
    .bind(channel_id)
    .fetch_optional(conn)
    .await
}

pub async fn create_chat(
    conn: &mut PgConnection,
    channel_id: Id,
    user_id: Id,
    body: &str,
) -> sqlx::Result<ChannelChat> {
    sqlx::query_as::<_, ChannelChat>(
        r"
        INSERT INTO channel_chats (channel_id, user_id, body)
        VALUES ($1, $2, $3)
        RETURNING *
        ",
    )
    .bind(channel_id)
    .bind(user_id)
    .bind(body)
    .fetch_one(conn)
    .await
}

/// Apply an edit. A body change marks the chat as edited.
pub async fn update_chat(
    conn: &mut PgConnection,
    chat_id: Id,
    body: UpdateChatRequest,
) -> sqlx::Result<ChannelChat> {
    update_content("channel_chats", chat_id, body)
        .build_query_as::<ChannelChat>()
        .fetch_one(conn)
        .await
}

pub async fn delete_chat(conn: &mut PgConnection, chat_id: Id) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM channel_chats WHERE id = $1")
        .bind(chat_id)
        .execute(conn)
        .await?;
    Ok(())
}

// ============================================================================
// Replies
// ============================================================================

pub async fn list_replies(
    conn: &mut PgConnection,
    chat_id: Id,
) -> sqlx::Result<Vec<ChannelChatReply>> {
    sqlx::query_as::<_, ChannelChatReply>(
        "SELECT * FROM channel_chat_replies WHERE channel_chat_id = $1 ORDER BY created_at, id",
    )
    .bind(chat_id)
    .fetch_all(conn)
    .await
}

pub async fn lock_reply(
    conn: &mut PgConnection,
    chat_id: Id,
    reply_id: Id,
) -> sqlx::Result<Option<ChannelChatReply>> {
    sqlx::query_as::<_, ChannelChatReply>(
        "SELECT * FROM channel_chat_replies WHERE id = $1 AND channel_chat_id = $2 FOR UPDATE",
    )
    .bind(reply_id)
    .bind(chat_id)
    .fetch_optional(conn)
    .await
}

pub async fn create_reply(
    conn: &mut PgConnection,
    chat_id: Id,
    user_id: Id,
    body: &str,
) -> sqlx::Result<ChannelChatReply> {
    sqlx::query_as::<_, ChannelChatReply>(
        r"
        INSERT INTO channel_chat_replies (channel_chat_id, user_id, body)
        VALUES ($1, $2, $3)
        RETURNING *
        ",
    )
    .bind(chat_id)
    .bind(user_id)
    .bind(body)
    .fetch_one(conn)
    .await
}

pub async fn update_reply(
    conn: &mut PgConnection,
    reply_id: Id,
    body: UpdateChatRequest,
) -> sqlx::Result<ChannelChatReply> {
    update_content("channel_chat_replies", reply_id, body)
        .build_query_as::<ChannelChatReply>()
        .fetch_one(conn)
        .await
}

pub async fn delete_reply(conn: &mut PgConnection, reply_id: Id) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM channel_chat_replies WHERE id = $1")
        .bind(reply_id)
        .execute(conn)
        .await?;
    Ok(())
}

// ============================================================================
// Photos
// ============================================================================

pub async fn list_photos(
    conn: &mut PgConnection,
    chat_id: Id,
) -> sqlx::Result<Vec<ChannelChatPhoto>> {
    sqlx::query_as::<_, ChannelChatPhoto>(
        "SELECT * FROM channel_chat_photos WHERE channel_chat_id = $1 ORDER BY id",
    )
    .bind(chat_id)
    .fetch_all(conn)
    .await
}

pub async fn find_photo(
    conn: &mut PgConnection,
    chat_id: Id,
    photo_id: Id,
) -> sqlx::Result<Option<ChannelChatPhoto>> {
    sqlx::query_as::<_, ChannelChatPhoto>(
        "SELECT * FROM channel_chat_photos WHERE id = $1 AND channel_chat_id = $2",
    )
    .bind(photo_id)
    .bind(chat_id)
    .fetch_optional(conn)
    .await
}

pub async fn create_photo(
    conn: &mut PgConnection,
    chat_id: Id,
    user_id: Id,
    image_url: &str,
) -> sqlx::Result<ChannelChatPhoto> {
    sqlx::query_as::<_, ChannelChatPhoto>(
        r"
        INSERT INTO channel_chat_photos (channel_chat_id, user_id, image_url)
        VALUES ($1, $2, $3)
        RETURNING *
        ",
    )
    .bind(chat_id)
    .bind(user_id)
    .bind(image_url)
    .fetch_one(conn)
    .await
}

pub async fn delete_photo(conn: &mut PgConnection, photo_id: Id) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM channel_chat_photos WHERE id = $1")
        .bind(photo_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Shared UPDATE for chats and replies.
fn update_content(
    table: &'static str,
    id: Id,
    body: UpdateChatRequest,
) -> QueryBuilder<'static, sqlx::Postgres> {
    let mut builder = QueryBuilder::new(format!("UPDATE {table} SET updated_at = NOW()"));
    if let Some(text) = body.body {
        builder.push(", body = ").push_bind(text);
        builder.push(", is_edited = TRUE");
    }
    if let Some(visible) = body.visible {
        builder.push(", visible = ").push_bind(visible);
    }
    builder.push(" WHERE id = ").push_bind(id);
    builder.push(" RETURNING *");
    builder
}
