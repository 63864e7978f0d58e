//! Permission helper functions for API handlers.
//!
//! Load the group and the principal's membership once, then answer every
//! follow-up question from the resulting [`GroupAccess`].

use thiserror::Error;

use super::models::{Decision, GroupAction, GroupRole, OwnedAction, PermissionError, ResourceKind};
use super::resolver::{decide_group_action, decide_owned_action, GroupFacts};
use super::store::ResourceStore;
use crate::auth::Principal;
use crate::db::{Channel, Group, GroupMembership, Id, LiveEvent};

/// Failure while loading and checking access.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error(transparent)]
    Denied(#[from] PermissionError),

    #[error("Membership store failure")]
    Store(#[from] sqlx::Error),
}

/// Pre-loaded permission context of one principal in one group.
#[derive(Debug, Clone)]
pub struct GroupAccess {
    pub principal: Principal,
    pub group: Group,
    /// The principal's membership row, if any.
    pub membership: Option<GroupMembership>,
}

impl GroupAccess {
    #[must_use]
    pub fn facts(&self) -> GroupFacts {
        GroupFacts {
            group_id: self.group.id,
            organizer_id: self.group.organizer_id,
            private: self.group.private,
            membership: self.membership.as_ref().map(|m| m.status),
        }
    }

    #[must_use]
    pub fn role(&self) -> GroupRole {
        self.facts().role_of(self.principal)
    }

    #[must_use]
    pub fn decide(&self, action: GroupAction) -> Decision {
        decide_group_action(self.principal, &self.facts(), action)
    }

    pub fn require(&self, action: GroupAction) -> Result<(), PermissionError> {
        self.decide(action).require()
    }

    /// Decide an action on content authored by `author_id` in this group.
    #[must_use]
    pub fn decide_owned(&self, author_id: Id, action: OwnedAction) -> Decision {
        decide_owned_action(self.principal, &self.facts(), author_id, action)
    }

    pub fn require_owned(&self, author_id: Id, action: OwnedAction) -> Result<(), PermissionError> {
        self.decide_owned(author_id, action).require()
    }
}

/// Load the group and the principal's membership.
///
/// A missing group is `NotFound`, before any permission is evaluated.
pub async fn load_group_access<S: ResourceStore>(
    store: &mut S,
    principal: Principal,
    group_id: Id,
) -> Result<GroupAccess, AccessError> {
    let group = store
        .find_group_by_id(group_id)
        .await?
        .ok_or(PermissionError::NotFound(ResourceKind::Group))?;

    let membership = match principal.user_id() {
        Some(user_id) => store.find_membership(group_id, user_id).await?,
        None => None,
    };

    Ok(GroupAccess {
        principal,
        group,
        membership,
    })
}

/// Like [`load_group_access`], but locks the principal's membership row and
/// `member_id`'s row for the rest of the transaction.
///
/// Rows are locked in ascending member id order so two actors working on
/// each other cannot deadlock. Returns the access and `member_id`'s row.
pub async fn lock_group_access<S: ResourceStore>(
    store: &mut S,
    principal: Principal,
    group_id: Id,
    member_id: Id,
) -> Result<(GroupAccess, Option<GroupMembership>), AccessError> {
    let group = store
        .find_group_by_id(group_id)
        .await?
        .ok_or(PermissionError::NotFound(ResourceKind::Group))?;

    let actor_id = principal.user_id();
    let mut order: Vec<Id> = actor_id.into_iter().chain([member_id]).collect();
    order.sort_unstable();
    order.dedup();

    let mut locked = Vec::with_capacity(order.len());
    for user_id in order {
        locked.extend(store.lock_membership(group_id, user_id).await?);
    }

    let row_of = |user_id: Id| locked.iter().find(|m| m.member_id == user_id).cloned();
    let membership = actor_id.and_then(&row_of);
    let target = row_of(member_id);

    Ok((
        GroupAccess {
            principal,
            group,
            membership,
        },
        target,
    ))
}

/// Load access and require `action` in one call.
pub async fn authorize_group<S: ResourceStore>(
    store: &mut S,
    principal: Principal,
    group_id: Id,
    action: GroupAction,
) -> Result<GroupAccess, AccessError> {
    let access = load_group_access(store, principal, group_id).await?;
    access.require(action)?;
    Ok(access)
}

/// Authorize `action` on the group, then load the channel.
///
/// The channel is only looked up after the group check passes, so outsiders
/// cannot probe which channels exist.
pub async fn authorize_channel<S: ResourceStore>(
    store: &mut S,
    principal: Principal,
    group_id: Id,
    channel_id: Id,
    action: GroupAction,
) -> Result<(GroupAccess, Channel), AccessError> {
    let access = authorize_group(store, principal, group_id, action).await?;
    let channel = store
        .find_channel_by_id(group_id, channel_id)
        .await?
        .ok_or(PermissionError::NotFound(ResourceKind::Channel))?;
    Ok((access, channel))
}

/// Authorize `action` on the group, then load the live event.
pub async fn authorize_live_event<S: ResourceStore>(
    store: &mut S,
    principal: Principal,
    group_id: Id,
    event_id: Id,
    action: GroupAction,
) -> Result<(GroupAccess, LiveEvent), AccessError> {
    let access = authorize_group(store, principal, group_id, action).await?;
    let event = store
        .find_live_event_by_id(group_id, event_id)
        .await?
        .ok_or(PermissionError::NotFound(ResourceKind::LiveEvent))?;
    Ok((access, event))
}
