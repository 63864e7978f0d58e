//! `PostgreSQL` implementation of the Membership Store.

use sqlx::PgConnection;

use super::store::ResourceStore;
use crate::db::{Channel, Conversation, Group, GroupMembership, Id, LiveEvent, MembershipStatus};

impl ResourceStore for PgConnection {
    async fn find_group_by_id(&mut self, group_id: Id) -> sqlx::Result<Option<Group>> {
        sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE id = $1")
            .bind(group_id)
            .fetch_optional(self)
            .await
    }

    async fn find_channel_by_id(
        &mut self,
        group_id: Id,
        channel_id: Id,
    ) -> sqlx::Result<Option<Channel>> {
        sqlx::query_as::<_, Channel>("SELECT * FROM channels WHERE id = $1 AND group_id = $2")
            .bind(channel_id)
            .bind(group_id)
            .fetch_optional(self)
            .await
    }

    async fn find_membership(
        &mut self,
        group_id: Id,
        user_id: Id,
    ) -> sqlx::Result<Option<GroupMembership>> {
        sqlx::query_as::<_, GroupMembership>(
            "SELECT * FROM group_memberships WHERE group_id = $1 AND member_id = $2",
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_optional(self)
        .await
    }

    async fn lock_membership(
        &mut self,
        group_id: Id,
        user_id: Id,
    ) -> sqlx::Result<Option<GroupMembership>> {
        sqlx::query_as::<_, GroupMembership>(
            "SELECT * FROM group_memberships WHERE group_id = $1 AND member_id = $2 FOR UPDATE",
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_optional(self)
        .await
    }

    async fn list_memberships(&mut self, group_id: Id) -> sqlx::Result<Vec<GroupMembership>> {
        sqlx::query_as::<_, GroupMembership>(
            "SELECT * FROM group_memberships WHERE group_id = $1 ORDER BY created_at, id",
        )
        .bind(group_id)
        .fetch_all(self)
        .await
    }

    async fn find_live_event_by_id(
        &mut self,
        group_id: Id,
        event_id: Id,
    ) -> sqlx::Result<Option<LiveEvent>> {
        sqlx::query_as::<_, LiveEvent>("SELECT * FROM live_events WHERE id = $1 AND group_id = $2")
            .bind(event_id)
            .bind(group_id)
            .fetch_optional(self)
            .await
    }

    async fn find_conversation_between(
        &mut self,
        user_a: Id,
        user_b: Id,
    ) -> sqlx::Result<Option<Conversation>> {
        sqlx::query_as::<_, Conversation>(
            r"
            SELECT * FROM conversations
            WHERE (user1_id = $1 AND user2_id = $2)
               OR (user1_id = $2 AND user2_id = $1)
            ",
        )
        .bind(user_a)
        .bind(user_b)
        .fetch_optional(self)
        .await
    }

    async fn user_exists(&mut self, user_id: Id) -> sqlx::Result<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(self)
            .await
    }

    async fn insert_membership(
        &mut self,
        group_id: Id,
        member_id: Id,
        status: MembershipStatus,
        invitation: &str,
    ) -> sqlx::Result<Option<GroupMembership>> {
        sqlx::query_as::<_, GroupMembership>(
            r"
            INSERT INTO group_memberships (group_id, member_id, status, invitation)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (group_id, member_id) DO NOTHING
            RETURNING *
            ",
        )
        .bind(group_id)
        .bind(member_id)
        .bind(status)
        .bind(invitation)
        .fetch_optional(self)
        .await
    }

    async fn update_membership_status(
        &mut self,
        membership_id: Id,
        status: MembershipStatus,
        invitation: Option<&str>,
    ) -> sqlx::Result<GroupMembership> {
        sqlx::query_as::<_, GroupMembership>(
            r"
            UPDATE group_memberships
            SET status = $2, invitation = COALESCE($3, invitation), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(membership_id)
        .bind(status)
        .bind(invitation)
        .fetch_one(self)
        .await
    }

    async fn delete_membership(&mut self, membership_id: Id) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM group_memberships WHERE id = $1")
            .bind(membership_id)
            .execute(self)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_conversation(
        &mut self,
        user_a: Id,
        user_b: Id,
    ) -> sqlx::Result<Option<Conversation>> {
        // The unique index on the unordered pair turns a concurrent
        // duplicate into a no-op.
        sqlx::query_as::<_, Conversation>(
            r"
            INSERT INTO conversations (user1_id, user2_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            RETURNING *
            ",
        )
        .bind(user_a)
        .bind(user_b)
        .fetch_optional(self)
        .await
    }
}
