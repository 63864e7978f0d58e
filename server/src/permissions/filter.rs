//! Visibility Filter.
//!
//! Applies per-candidate visibility rules to list queries. Each candidate is
//! judged independently and input order is preserved.

use std::collections::HashMap;

use super::models::GroupRole;
use crate::auth::Principal;
use crate::db::{ChannelChat, ChannelChatReply, Group, GroupMembership, Id, LiveEvent, MembershipStatus};

/// A visibility rule over candidates of type `T`.
pub trait VisibilityRule<T> {
    fn is_visible(&self, principal: Principal, candidate: &T) -> bool;
}

/// Keep the candidates visible to `principal`, in input order.
pub fn filter_list<T, R>(principal: Principal, candidates: Vec<T>, rule: &R) -> Vec<T>
where
    R: VisibilityRule<T> + ?Sized,
{
    candidates
        .into_iter()
        .filter(|candidate| rule.is_visible(principal, candidate))
        .collect()
}

/// Group listing: public groups, groups the principal organizes, and groups
/// where the principal has a membership row of any status.
#[derive(Debug, Default)]
pub struct GroupListing {
    /// Principal's memberships keyed by group id.
    memberships: HashMap<Id, MembershipStatus>,
}

impl GroupListing {
    pub fn new(memberships: impl IntoIterator<Item = GroupMembership>) -> Self {
        Self {
            memberships: memberships
                .into_iter()
                .map(|m| (m.group_id, m.status))
                .collect(),
        }
    }

    /// The principal's membership status in `group_id`, if any.
    pub fn status_in(&self, group_id: Id) -> Option<MembershipStatus> {
        self.memberships.get(&group_id).copied()
    }
}

impl VisibilityRule<Group> for GroupListing {
    fn is_visible(&self, principal: Principal, group: &Group) -> bool {
        !group.private || principal.is(group.organizer_id) || self.memberships.contains_key(&group.id)
    }
}

/// Live events inside one group: private events only for their creator and
/// elevated roles.
#[derive(Debug, Clone, Copy)]
pub struct LiveEventListing {
    /// Principal's role in the group the events belong to.
    pub role: GroupRole,
}

impl VisibilityRule<LiveEvent> for LiveEventListing {
    fn is_visible(&self, principal: Principal, event: &LiveEvent) -> bool {
        !event.private || principal.is(event.creator_id) || self.role.is_elevated()
    }
}

/// Moderated content: hidden items remain visible to their author only.
#[derive(Debug, Clone, Copy)]
pub struct HiddenContent;

impl VisibilityRule<ChannelChatReply> for HiddenContent {
    fn is_visible(&self, principal: Principal, reply: &ChannelChatReply) -> bool {
        reply.visible || principal.is(reply.user_id)
    }
}

impl VisibilityRule<ChannelChat> for HiddenContent {
    fn is_visible(&self, principal: Principal, chat: &ChannelChat) -> bool {
        chat.visible || principal.is(chat.user_id)
    }
}

/// Member listing: pending requests are shown to the organizer only.
/// Co-admins do not see them.
#[derive(Debug, Clone, Copy)]
pub struct MemberListing {
    pub organizer_id: Id,
}

impl VisibilityRule<GroupMembership> for MemberListing {
    fn is_visible(&self, principal: Principal, membership: &GroupMembership) -> bool {
        membership.status != MembershipStatus::Pending || principal.is(self.organizer_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::EventRepeat;
    use chrono::Utc;

    fn group(id: Id, organizer_id: Id, private: bool) -> Group {
        Group {
            id,
            organizer_id,
            name: format!("Group {id}"),
            description: "A group used for visibility filtering tests only".to_string(),
            private,
            invitation_code: "ABCDEFGHIJKLMNOP".to_string(),
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn membership(id: Id, group_id: Id, member_id: Id, status: MembershipStatus) -> GroupMembership {
        GroupMembership {
            id,
            group_id,
            member_id,
            status,
            invitation: "ABCDEFGHIJKLMNOP".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn reply(id: Id, user_id: Id, visible: bool) -> ChannelChatReply {
        ChannelChatReply {
            id,
            channel_chat_id: 1,
            user_id,
            body: format!("reply {id}"),
            visible,
            is_edited: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn event(id: Id, creator_id: Id, private: bool) -> LiveEvent {
        LiveEvent {
            id,
            group_id: 1,
            creator_id,
            name: format!("Event {id}"),
            description: "An event used for visibility filtering tests".to_string(),
            repeat: EventRepeat::Daily,
            private,
            private_invitation: "ABCDEFGHIJKLMNOP".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn ids<T>(items: &[T], id: impl Fn(&T) -> Id) -> Vec<Id> {
        items.iter().map(id).collect()
    }

    #[test]
    fn test_group_listing() {
        let user = Principal::User(5);
        let groups = vec![
            group(1, 9, false),
            group(2, 9, true),
            group(3, 5, true),
            group(4, 9, true),
        ];
        // Pending membership in group 4 is enough to see it
        let rule = GroupListing::new(vec![membership(100, 4, 5, MembershipStatus::Pending)]);

        let visible = filter_list(user, groups.clone(), &rule);
        assert_eq!(ids(&visible, |g| g.id), vec![1, 3, 4]);
        assert_eq!(rule.status_in(4), Some(MembershipStatus::Pending));
        assert_eq!(rule.status_in(1), None);

        let anonymous = filter_list(Principal::Anonymous, groups, &GroupListing::default());
        assert_eq!(ids(&anonymous, |g| g.id), vec![1]);
    }

    #[test]
    fn test_hidden_replies_visible_to_author_only() {
        let replies = vec![reply(1, 7, true), reply(2, 7, false), reply(3, 8, false)];

        for viewer in [7, 8, 9] {
            let visible = filter_list(Principal::User(viewer), replies.clone(), &HiddenContent);
            for r in &replies {
                let shown = visible.iter().any(|v| v.id == r.id);
                assert_eq!(shown, r.visible || r.user_id == viewer);
            }
        }

        let anonymous = filter_list(Principal::Anonymous, replies, &HiddenContent);
        assert_eq!(ids(&anonymous, |r| r.id), vec![1]);
    }

    #[test]
    fn test_live_event_listing() {
        let events = vec![event(1, 3, false), event(2, 3, true), event(3, 5, true)];

        let member = LiveEventListing {
            role: GroupRole::Member,
        };
        let visible = filter_list(Principal::User(5), events.clone(), &member);
        assert_eq!(ids(&visible, |e| e.id), vec![1, 3]);

        let co_admin = LiveEventListing {
            role: GroupRole::CoAdmin,
        };
        let visible = filter_list(Principal::User(6), events, &co_admin);
        assert_eq!(ids(&visible, |e| e.id), vec![1, 2, 3]);
    }

    #[test]
    fn test_member_listing_hides_pending_from_co_admins() {
        let members = vec![
            membership(1, 1, 10, MembershipStatus::Member),
            membership(2, 1, 11, MembershipStatus::Pending),
            membership(3, 1, 12, MembershipStatus::CoAdmin),
        ];
        let rule = MemberListing { organizer_id: 99 };

        let organizer_view = filter_list(Principal::User(99), members.clone(), &rule);
        assert_eq!(ids(&organizer_view, |m| m.id), vec![1, 2, 3]);

        // Co-admin (member 12) still doesn't see pending requests
        let co_admin_view = filter_list(Principal::User(12), members, &rule);
        assert_eq!(ids(&co_admin_view, |m| m.id), vec![1, 3]);
    }

    #[test]
    fn test_order_is_preserved() {
        let replies = vec![reply(3, 1, true), reply(1, 1, true), reply(2, 1, true)];
        let visible = filter_list(Principal::Anonymous, replies, &HiddenContent);
        assert_eq!(ids(&visible, |r| r.id), vec![3, 1, 2]);
    }
}
