//! Authorization decisions.
//!
//! Pure functions mapping (principal, resource, action) to a [`Decision`].
//! Role precedence, first match wins:
//! 1. Group organizer
//! 2. Co-admin membership
//! 3. Member membership (pending only for reading)
//! 4. Everyone else
//!
//! Author ownership is a second grant path ORed with the group path.
//! Conversations ignore groups entirely.

use crate::auth::Principal;
use crate::db::{Conversation, Id, LiveEvent, MembershipStatus};

use super::models::{
    Action, ConversationAction, Decision, GroupAction, GroupRole, OwnedAction, PermissionError,
    ResourceKind,
};

/// Membership facts about one group as seen by one principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupFacts {
    pub group_id: Id,
    pub organizer_id: Id,
    pub private: bool,
    /// Status of the principal's membership row, if any.
    pub membership: Option<MembershipStatus>,
}

impl GroupFacts {
    /// Effective role of `principal` in this group.
    #[must_use]
    pub fn role_of(&self, principal: Principal) -> GroupRole {
        resolve_role(principal, self.organizer_id, self.membership)
    }
}

/// A resource reference handed to [`decide`].
#[derive(Debug, Clone, Copy)]
pub enum ResourceRef<'a> {
    /// The group itself or anything inside it without an author.
    Group(&'a GroupFacts),
    /// Content inside a group with an author (chat, reply, photo, event, attendance).
    Authored { group: &'a GroupFacts, author_id: Id },
    /// A direct-message conversation.
    Conversation(&'a Conversation),
}

/// Path through which an attendance grant was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceGrant {
    /// Self RSVP to a non-private event.
    Open,
    /// Registered by the event creator or an elevated role.
    Delegated,
    /// Self RSVP backed by the event's private invitation.
    Invitation,
}

/// Resolve the effective role.
///
/// Anonymous principals are always outsiders. The organizer outranks any
/// membership row they might also have.
#[must_use]
pub fn resolve_role(
    principal: Principal,
    organizer_id: Id,
    membership: Option<MembershipStatus>,
) -> GroupRole {
    let Some(user_id) = principal.user_id() else {
        return GroupRole::Outsider;
    };

    if user_id == organizer_id {
        return GroupRole::Organizer;
    }

    membership.map_or(GroupRole::Outsider, GroupRole::from_status)
}

/// Single entry point for every decision.
///
/// Resource/action pairs that make no sense are denied.
#[must_use]
pub fn decide(principal: Principal, resource: ResourceRef<'_>, action: Action) -> Decision {
    match (resource, action) {
        (ResourceRef::Group(facts), Action::Group(action))
        | (ResourceRef::Authored { group: facts, .. }, Action::Group(action)) => {
            decide_group_action(principal, facts, action)
        }
        (ResourceRef::Authored { group, author_id }, Action::Owned(action)) => {
            decide_owned_action(principal, group, author_id, action)
        }
        (ResourceRef::Conversation(conversation), Action::Conversation(action)) => {
            decide_conversation(principal, conversation, action)
        }
        _ => Decision::Deny(PermissionError::Forbidden),
    }
}

/// Decide a group-scoped action.
#[must_use]
pub fn decide_group_action(
    principal: Principal,
    facts: &GroupFacts,
    action: GroupAction,
) -> Decision {
    let role = facts.role_of(principal);

    match action {
        GroupAction::ViewGroup => {
            if !facts.private {
                Decision::Allow
            } else {
                grant_if(role.belongs(), role, principal)
            }
        }
        GroupAction::ViewContent => grant_if(role.belongs(), role, principal),
        GroupAction::Contribute => grant_if(role.is_approved(), role, principal),
        GroupAction::ManageChannels | GroupAction::Moderate | GroupAction::ViewInvitation => {
            grant_if(role.is_elevated(), role, principal)
        }
        GroupAction::UpdateGroup | GroupAction::DeleteGroup | GroupAction::ViewPendingMembers => {
            grant_if(role == GroupRole::Organizer, role, principal)
        }
    }
}

/// Decide an action on authored content.
///
/// The author grant and the elevated group grant are independent; either
/// one suffices for `Manage` and `Delete`. `Edit` is author-only.
#[must_use]
pub fn decide_owned_action(
    principal: Principal,
    facts: &GroupFacts,
    author_id: Id,
    action: OwnedAction,
) -> Decision {
    let by_author = if principal.is(author_id) {
        Decision::Allow
    } else if principal.is_anonymous() {
        Decision::Deny(PermissionError::NotAuthenticated)
    } else {
        Decision::Deny(PermissionError::NotAuthor)
    };

    match action {
        OwnedAction::Edit => by_author,
        OwnedAction::Manage | OwnedAction::Delete => {
            by_author.or(decide_group_action(principal, facts, GroupAction::Moderate))
        }
    }
}

/// Decide an action on a conversation. Participants only.
#[must_use]
pub fn decide_conversation(
    principal: Principal,
    conversation: &Conversation,
    _action: ConversationAction,
) -> Decision {
    match principal.user_id() {
        None => Decision::Deny(PermissionError::NotAuthenticated),
        Some(user_id) if conversation.has_participant(user_id) => Decision::Allow,
        Some(_) => Decision::Deny(PermissionError::NotParticipant),
    }
}

/// Decide whether a single live event may be read.
///
/// Private events are readable by their creator, elevated roles and
/// registered attendees. To everyone else they do not exist.
#[must_use]
pub fn decide_view_event(
    principal: Principal,
    facts: &GroupFacts,
    event: &LiveEvent,
    is_attendee: bool,
) -> Decision {
    let base = decide_group_action(principal, facts, GroupAction::ViewContent);
    if !base.is_allowed() || !event.private {
        return base;
    }

    let role = facts.role_of(principal);
    if principal.is(event.creator_id) || role.is_elevated() || is_attendee {
        Decision::Allow
    } else {
        Decision::Deny(PermissionError::NotFound(ResourceKind::LiveEvent))
    }
}

/// Decide an RSVP of `target_user` to `event`.
///
/// Registering someone else requires the event creator or an elevated role.
/// A self RSVP to a private event additionally needs that standing or the
/// event's private invitation. Callers who cannot see a private event get
/// `NotFound` unless they present its invitation.
pub fn decide_attendance(
    principal: Principal,
    facts: &GroupFacts,
    event: &LiveEvent,
    is_attendee: bool,
    target_user: Id,
    presented_invitation: Option<&str>,
) -> Result<AttendanceGrant, PermissionError> {
    decide_group_action(principal, facts, GroupAction::Contribute).require()?;

    let role = facts.role_of(principal);
    let event_authority = principal.is(event.creator_id) || role.is_elevated();
    let hidden = event.private && !event_authority && !is_attendee;
    let denied = |reason| {
        if hidden {
            PermissionError::NotFound(ResourceKind::LiveEvent)
        } else {
            reason
        }
    };

    if !principal.is(target_user) {
        return if event_authority {
            Ok(AttendanceGrant::Delegated)
        } else {
            Err(denied(PermissionError::InsufficientRole))
        };
    }

    if !event.private {
        return Ok(AttendanceGrant::Open);
    }

    if event_authority {
        return Ok(AttendanceGrant::Delegated);
    }

    match presented_invitation {
        Some(token) if token == event.private_invitation => Ok(AttendanceGrant::Invitation),
        _ => Err(denied(PermissionError::InvalidInvitation)),
    }
}

/// Decide removal of an attendance row: attendee, event creator or
/// elevated role.
#[must_use]
pub fn decide_remove_attendance(
    principal: Principal,
    facts: &GroupFacts,
    event: &LiveEvent,
    attendee_id: Id,
) -> Decision {
    let by_creator = if principal.is(event.creator_id) {
        Decision::Allow
    } else {
        Decision::Deny(PermissionError::NotAuthor)
    };

    decide_owned_action(principal, facts, attendee_id, OwnedAction::Delete).or(by_creator)
}

fn grant_if(allowed: bool, role: GroupRole, principal: Principal) -> Decision {
    if allowed {
        Decision::Allow
    } else if principal.is_anonymous() {
        Decision::Deny(PermissionError::NotAuthenticated)
    } else if role.belongs() {
        Decision::Deny(PermissionError::InsufficientRole)
    } else {
        Decision::Deny(PermissionError::NotMember)
    }
}
