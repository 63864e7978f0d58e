//! Membership Store.
//!
//! Typed lookups the authorization layer needs from persistence. No
//! authorization logic lives behind this trait.

use std::future::Future;

use crate::db::{Channel, Conversation, Group, GroupMembership, Id, LiveEvent, MembershipStatus};

/// Persisted-entity lookups and the few writes the membership lifecycle
/// performs.
///
/// Implemented for `PgConnection`, so callers pass either a pooled
/// connection or `&mut *tx` to run inside a transaction.
pub trait ResourceStore: Send {
    fn find_group_by_id(
        &mut self,
        group_id: Id,
    ) -> impl Future<Output = sqlx::Result<Option<Group>>> + Send;

    /// Channel `channel_id` only if it belongs to `group_id`.
    fn find_channel_by_id(
        &mut self,
        group_id: Id,
        channel_id: Id,
    ) -> impl Future<Output = sqlx::Result<Option<Channel>>> + Send;

    fn find_membership(
        &mut self,
        group_id: Id,
        user_id: Id,
    ) -> impl Future<Output = sqlx::Result<Option<GroupMembership>>> + Send;

    /// Same as [`find_membership`](Self::find_membership) but holds a row
    /// lock until the surrounding transaction ends.
    fn lock_membership(
        &mut self,
        group_id: Id,
        user_id: Id,
    ) -> impl Future<Output = sqlx::Result<Option<GroupMembership>>> + Send;

    /// Memberships of a group, oldest first.
    fn list_memberships(
        &mut self,
        group_id: Id,
    ) -> impl Future<Output = sqlx::Result<Vec<GroupMembership>>> + Send;

    /// Live event `event_id` only if it belongs to `group_id`.
    fn find_live_event_by_id(
        &mut self,
        group_id: Id,
        event_id: Id,
    ) -> impl Future<Output = sqlx::Result<Option<LiveEvent>>> + Send;

    /// Conversation between two users in either direction.
    fn find_conversation_between(
        &mut self,
        user_a: Id,
        user_b: Id,
    ) -> impl Future<Output = sqlx::Result<Option<Conversation>>> + Send;

    fn user_exists(&mut self, user_id: Id) -> impl Future<Output = sqlx::Result<bool>> + Send;

    /// Insert a membership. `None` if one already exists for the pair.
    fn insert_membership(
        &mut self,
        group_id: Id,
        member_id: Id,
        status: MembershipStatus,
        invitation: &str,
    ) -> impl Future<Output = sqlx::Result<Option<GroupMembership>>> + Send;

    /// Set a membership's status, optionally replacing its invitation.
    fn update_membership_status(
        &mut self,
        membership_id: Id,
        status: MembershipStatus,
        invitation: Option<&str>,
    ) -> impl Future<Output = sqlx::Result<GroupMembership>> + Send;

    /// Delete a membership. Returns whether a row was removed.
    fn delete_membership(
        &mut self,
        membership_id: Id,
    ) -> impl Future<Output = sqlx::Result<bool>> + Send;

    /// Insert a conversation. `None` if the unordered pair already has one.
    fn insert_conversation(
        &mut self,
        user_a: Id,
        user_b: Id,
    ) -> impl Future<Output = sqlx::Result<Option<Conversation>>> + Send;
}
