//! Conversation and Message Queries

use sqlx::{PgConnection, PgPool};

use crate::db::{Conversation, Id, Message};

/// Conversations the user takes part in, newest first.
pub async fn list_conversations(pool: &PgPool, user_id: Id) -> sqlx::Result<Vec<Conversation>> {
    sqlx::query_as::<_, Conversation>(
        r"
        SELECT * FROM conversations
        WHERE user1_id = $1 OR user2_id = $1
        ORDER BY created_at DESC, id DESC
        ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn find_conversation(
    conn: &mut PgConnection,
    conversation_id: Id,
) -> sqlx::Result<Option<Conversation>> {
    sqlx::query_as::<_, Conversation>("SELECT * FROM conversations WHERE id = $1")
        .bind(conversation_id)
        .fetch_optional(conn)
        .await
}

pub async fn lock_conversation(
    conn: &mut PgConnection,
    conversation_id: Id,
) -> sqlx::Result<Option<Conversation>> {
    sqlx::query_as::<_, Conversation>("SELECT * FROM conversations WHERE id = $1 FOR UPDATE")
        .bind(conversation_id)
        .fetch_optional(conn)
        .await
}

/// Remove the conversation's messages, then the conversation.
///
/// Run inside a transaction so a failure leaves both in place.
pub async fn delete_conversation(conn: &mut PgConnection, conversation_id: Id) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM messages WHERE conversation_id = $1")
        .bind(conversation_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query("DELETE FROM conversations WHERE id = $1")
        .bind(conversation_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

pub async fn list_messages(conn: &mut PgConnection, conversation_id: Id) -> sqlx::Result<Vec<Message>> {
    sqlx::query_as::<_, Message>(
        "SELECT * FROM messages WHERE conversation_id = $1 ORDER BY sent_at, id",
    )
    .bind(conversation_id)
    .fetch_all(conn)
    .await
}

pub async fn create_message(
    conn: &mut PgConnection,
    conversation_id: Id,
    user_id: Id,
    content: &str,
) -> sqlx::Result<Message> {
    sqlx::query_as::<_, Message>(
        r"
        INSERT INTO messages (conversation_id, user_id, content)
        VALUES ($1, $2, $3)
        RETURNING *
        ",
    )
    .bind(conversation_id)
    .bind(user_id)
    .bind(content)
    .fetch_one(conn)
    .await
}

pub async fn lock_message(conn: &mut PgConnection, message_id: Id) -> sqlx::Result<Option<Message>> {
    sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = $1 FOR UPDATE")
        .bind(message_id)
        .fetch_optional(conn)
        .await
}

/// Replace a message's content, keeping the old content as its single
/// level of history.
pub async fn rewrite_message(
    conn: &mut PgConnection,
    message_id: Id,
    content: &str,
    previous_content: &str,
) -> sqlx::Result<Message> {
    sqlx::query_as::<_, Message>(
        r"
        UPDATE messages
        SET content = $2, previous_content = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        ",
    )
    .bind(message_id)
    .bind(content)
    .bind(previous_content)
    .fetch_one(conn)
    .await
}
