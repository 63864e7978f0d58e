//! Group Queries

use sqlx::{PgConnection, PgPool, QueryBuilder};

use super::types::UpdateGroupRequest;
use crate::db::{Group, GroupMembership, Id};

/// All groups, oldest first.
pub async fn list_groups(pool: &PgPool) -> sqlx::Result<Vec<Group>> {
    sqlx::query_as::<_, Group>("SELECT * FROM groups ORDER BY id")
        .fetch_all(pool)
        .await
}

/// Groups organized by the user or holding any membership of theirs.
pub async fn list_groups_for_user(pool: &PgPool, user_id: Id) -> sqlx::Result<Vec<Group>> {
    sqlx::query_as::<_, Group>(
        r"
        SELECT g.* FROM groups g
        WHERE g.organizer_id = $1
           OR EXISTS (
               SELECT 1 FROM group_memberships gm
               WHERE gm.group_id = g.id AND gm.member_id = $1
           )
        ORDER BY g.id
        ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Every membership row of one user.
pub async fn list_user_memberships(
    pool: &PgPool,
    user_id: Id,
) -> sqlx::Result<Vec<GroupMembership>> {
    sqlx::query_as::<_, GroupMembership>("SELECT * FROM group_memberships WHERE member_id = $1")
        .bind(user_id)
        .fetch_all(pool)
        .await
}

/// Fields of a group about to be created.
#[derive(Debug, Clone, Copy)]
pub struct NewGroup<'a> {
    pub organizer_id: Id,
    pub name: &'a str,
    pub description: &'a str,
    pub private: bool,
    pub image_url: Option<&'a str>,
    pub invitation_code: &'a str,
}

/// Insert a group. `None` when the name is taken.
pub async fn create_group(pool: &PgPool, new: NewGroup<'_>) -> sqlx::Result<Option<Group>> {
    sqlx::query_as::<_, Group>(
        r"
        INSERT INTO groups (organizer_id, name, description, private, image_url, invitation_code)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT DO NOTHING
        RETURNING *
        ",
    )
    .bind(new.organizer_id)
    .bind(new.name)
    .bind(new.description)
    .bind(new.private)
    .bind(new.image_url)
    .bind(new.invitation_code)
    .fetch_optional(pool)
    .await
}

/// Apply a partial update. `Ok(None)` when the new name is taken.
pub async fn update_group(
    conn: &mut PgConnection,
    group_id: Id,
    body: UpdateGroupRequest,
) -> sqlx::Result<Option<Group>> {
    let mut builder = QueryBuilder::new("UPDATE groups SET updated_at = NOW()");
    if let Some(name) = body.name {
        builder.push(", name = ").push_bind(name);
    }
    if let Some(description) = body.description {
        builder.push(", description = ").push_bind(description);
    }
    if let Some(private) = body.private {
        builder.push(", private = ").push_bind(private);
    }
    if let Some(image_url) = body.image_url {
        builder.push(", image_url = ").push_bind(image_url);
    }
    builder.push(" WHERE id = ").push_bind(group_id);
    builder.push(" RETURNING *");

    match builder.build_query_as::<Group>().fetch_one(conn).await {
        Ok(group) => Ok(Some(group)),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Delete a group. Children go with it through `ON DELETE CASCADE`.
pub async fn delete_group(conn: &mut PgConnection, group_id: Id) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM groups WHERE id = $1")
        .bind(group_id)
        .execute(conn)
        .await?;
    Ok(())
}
