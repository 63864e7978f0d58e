//! Live Event and Attendance Queries

use sqlx::{PgConnection, QueryBuilder};

use super::types::{CreateLiveEventRequest, UpdateLiveEventRequest};
use crate::db::{Attendance, Id, LiveEvent};

pub async fn list_events(conn: &mut PgConnection, group_id: Id) -> sqlx::Result<Vec<LiveEvent>> {
    sqlx::query_as::<_, LiveEvent>(
        "SELECT * FROM live_events WHERE group_id = $1 ORDER BY created_at, id",
    )
    .bind(group_id)
    .fetch_all(conn)
    .await
}

pub async fn create_event(
    conn: &mut PgConnection,
    group_id: Id,
    creator_id: Id,
    body: &CreateLiveEventRequest,
    private_invitation: &str,
) -> sqlx::Result<LiveEvent> {
    sqlx::query_as::<_, LiveEvent>(
        r"
        INSERT INTO live_events (group_id, creator_id, name, description, repeat, private, private_invitation)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        ",
    )
    .bind(group_id)
    .bind(creator_id)
    .bind(&body.name)
    .bind(&body.description)
    .bind(body.repeat)
    .bind(body.private)
    .bind(private_invitation)
    .fetch_one(conn)
    .await
}

pub async fn update_event(
    conn: &mut PgConnection,
    event_id: Id,
    body: UpdateLiveEventRequest,
) -> sqlx::Result<LiveEvent> {
    let mut builder = QueryBuilder::new("UPDATE live_events SET updated_at = NOW()");
    if let Some(name) = body.name {
        builder.push(", name = ").push_bind(name);
    }
    if let Some(description) = body.description {
        builder.push(", description = ").push_bind(description);
    }
    if let Some(repeat) = body.repeat {
        builder.push(", repeat = ").push_bind(repeat);
    }
    if let Some(private) = body.private {
        builder.push(", private = ").push_bind(private);
    }
    builder.push(" WHERE id = ").push_bind(event_id);
    builder.push(" RETURNING *");

    builder.build_query_as::<LiveEvent>().fetch_one(conn).await
}

pub async fn delete_event(conn: &mut PgConnection, event_id: Id) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM live_events WHERE id = $1")
        .bind(event_id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn list_attendance(
    conn: &mut PgConnection,
    event_id: Id,
) -> sqlx::Result<Vec<Attendance>> {
    sqlx::query_as::<_, Attendance>(
        "SELECT * FROM live_event_attendance WHERE live_event_id = $1 ORDER BY id",
    )
    .bind(event_id)
    .fetch_all(conn)
    .await
}

pub async fn is_attending(conn: &mut PgConnection, event_id: Id, user_id: Id) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM live_event_attendance WHERE live_event_id = $1 AND user_id = $2)",
    )
    .bind(event_id)
    .bind(user_id)
    .fetch_one(conn)
    .await
}

pub async fn find_attendance(
    conn: &mut PgConnection,
    event_id: Id,
    attendance_id: Id,
) -> sqlx::Result<Option<Attendance>> {
    sqlx::query_as::<_, Attendance>(
        "SELECT * FROM live_event_attendance WHERE id = $1 AND live_event_id = $2",
    )
    .bind(attendance_id)
    .bind(event_id)
    .fetch_optional(conn)
    .await
}

/// Record an RSVP. `None` if the user already attends.
pub async fn create_attendance(
    conn: &mut PgConnection,
    event_id: Id,
    user_id: Id,
    invitation: &str,
) -> sqlx::Result<Option<Attendance>> {
    sqlx::query_as::<_, Attendance>(
        r"
        INSERT INTO live_event_attendance (live_event_id, user_id, invitation)
        VALUES ($1, $2, $3)
        ON CONFLICT (live_event_id, user_id) DO NOTHING
        RETURNING *
        ",
    )
    .bind(event_id)
    .bind(user_id)
    .bind(invitation)
    .fetch_optional(conn)
    .await
}

pub async fn delete_attendance(conn: &mut PgConnection, attendance_id: Id) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM live_event_attendance WHERE id = $1")
        .bind(attendance_id)
        .execute(conn)
        .await?;
    Ok(())
}
