//! In-memory Membership Store for unit tests.

use std::collections::HashSet;

use chrono::Utc;

use super::store::ResourceStore;
use crate::db::{
    Channel, ChannelType, Conversation, EventRepeat, Group, GroupMembership, Id, LiveEvent,
    MembershipStatus,
};

#[derive(Debug, Default)]
pub struct MemoryStore {
    pub users: HashSet<Id>,
    pub groups: Vec<Group>,
    pub channels: Vec<Channel>,
    pub memberships: Vec<GroupMembership>,
    pub events: Vec<LiveEvent>,
    pub conversations: Vec<Conversation>,
    /// Member ids passed to `lock_membership`, in call order.
    pub locked: Vec<Id>,
    next_id: Id,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_id: 1000,
            ..Self::default()
        }
    }

    fn next_id(&mut self) -> Id {
        self.next_id += 1;
        self.next_id
    }

    pub fn add_user(&mut self, id: Id) {
        self.users.insert(id);
    }

    pub fn add_group(&mut self, id: Id, organizer_id: Id, private: bool) -> Group {
        self.users.insert(organizer_id);
        let group = Group {
            id,
            organizer_id,
            name: format!("Group {id}"),
            description: "An in-memory group used to exercise authorization rules".to_string(),
            private,
            invitation_code: "GROUPCODE0000000".to_string(),
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.groups.push(group.clone());
        group
    }

    pub fn add_membership(
        &mut self,
        group_id: Id,
        member_id: Id,
        status: MembershipStatus,
    ) -> GroupMembership {
        self.users.insert(member_id);
        let membership = GroupMembership {
            id: self.next_id(),
            group_id,
            member_id,
            status,
            invitation: "MEMBERTOKEN00000".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.memberships.push(membership.clone());
        membership
    }

    pub fn add_channel(&mut self, id: Id, group_id: Id, creator_id: Id) -> Channel {
        let channel = Channel {
            id,
            group_id,
            creator_id,
            name: format!("channel-{id}"),
            channel_type: ChannelType::Text,
            private: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.channels.push(channel.clone());
        channel
    }

    pub fn add_event(&mut self, id: Id, group_id: Id, creator_id: Id, private: bool) -> LiveEvent {
        let event = LiveEvent {
            id,
            group_id,
            creator_id,
            name: format!("Event {id}"),
            description: "An in-memory live event for authorization tests".to_string(),
            repeat: EventRepeat::Monthly,
            private,
            private_invitation: "EVENTTOKEN000000".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.events.push(event.clone());
        event
    }

    pub fn membership_count(&self, group_id: Id, member_id: Id) -> usize {
        self.memberships
            .iter()
            .filter(|m| m.group_id == group_id && m.member_id == member_id)
            .count()
    }

    fn membership(&self, group_id: Id, user_id: Id) -> Option<GroupMembership> {
        self.memberships
            .iter()
            .find(|m| m.group_id == group_id && m.member_id == user_id)
            .cloned()
    }
}

impl ResourceStore for MemoryStore {
    async fn find_group_by_id(&mut self, group_id: Id) -> sqlx::Result<Option<Group>> {
        Ok(self.groups.iter().find(|g| g.id == group_id).cloned())
    }

    async fn find_channel_by_id(
        &mut self,
        group_id: Id,
        channel_id: Id,
    ) -> sqlx::Result<Option<Channel>> {
        Ok(self
            .channels
            .iter()
            .find(|c| c.id == channel_id && c.group_id == group_id)
            .cloned())
    }

    async fn find_membership(
        &mut self,
        group_id: Id,
        user_id: Id,
    ) -> sqlx::Result<Option<GroupMembership>> {
        Ok(self.membership(group_id, user_id))
    }

    async fn lock_membership(
        &mut self,
        group_id: Id,
        user_id: Id,
    ) -> sqlx::Result<Option<GroupMembership>> {
        self.locked.push(user_id);
        Ok(self.membership(group_id, user_id))
    }

    async fn list_memberships(&mut self, group_id: Id) -> sqlx::Result<Vec<GroupMembership>> {
        Ok(self
            .memberships
            .iter()
            .filter(|m| m.group_id == group_id)
            .cloned()
            .collect())
    }

    async fn find_live_event_by_id(
        &mut self,
        group_id: Id,
        event_id: Id,
    ) -> sqlx::Result<Option<LiveEvent>> {
        Ok(self
            .events
            .iter()
            .find(|e| e.id == event_id && e.group_id == group_id)
            .cloned())
    }

    async fn find_conversation_between(
        &mut self,
        user_a: Id,
        user_b: Id,
    ) -> sqlx::Result<Option<Conversation>> {
        Ok(self
            .conversations
            .iter()
            .find(|c| {
                (c.user1_id == user_a && c.user2_id == user_b)
                    || (c.user1_id == user_b && c.user2_id == user_a)
            })
            .cloned())
    }

    async fn user_exists(&mut self, user_id: Id) -> sqlx::Result<bool> {
        Ok(self.users.contains(&user_id))
    }

    async fn insert_membership(
        &mut self,
        group_id: Id,
        member_id: Id,
        status: MembershipStatus,
        invitation: &str,
    ) -> sqlx::Result<Option<GroupMembership>> {
        if self.membership(group_id, member_id).is_some() {
            return Ok(None);
        }
        let mut membership = self.add_membership(group_id, member_id, status);
        membership.invitation = invitation.to_string();
        if let Some(stored) = self.memberships.last_mut() {
            stored.invitation = invitation.to_string();
        }
        Ok(Some(membership))
    }

    async fn update_membership_status(
        &mut self,
        membership_id: Id,
        status: MembershipStatus,
        invitation: Option<&str>,
    ) -> sqlx::Result<GroupMembership> {
        let membership = self
            .memberships
            .iter_mut()
            .find(|m| m.id == membership_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        membership.status = status;
        if let Some(invitation) = invitation {
            membership.invitation = invitation.to_string();
        }
        membership.updated_at = Utc::now();
        Ok(membership.clone())
    }

    async fn delete_membership(&mut self, membership_id: Id) -> sqlx::Result<bool> {
        let before = self.memberships.len();
        self.memberships.retain(|m| m.id != membership_id);
        Ok(self.memberships.len() < before)
    }

    async fn insert_conversation(
        &mut self,
        user_a: Id,
        user_b: Id,
    ) -> sqlx::Result<Option<Conversation>> {
        if self.find_conversation_between(user_a, user_b).await?.is_some() {
            return Ok(None);
        }
        let conversation = Conversation {
            id: self.next_id(),
            user1_id: user_a,
            user2_id: user_b,
            created_at: Utc::now(),
        };
        self.conversations.push(conversation.clone());
        Ok(Some(conversation))
    }
}
