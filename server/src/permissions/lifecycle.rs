//! Membership Lifecycle.
//!
//! ```text
//! (none) --request--> pending --approve--> member <--demote/promote--> co-admin
//!                        \______________promote____________________/
//! ```
//!
//! Nothing ever moves back to `pending`. Persistence happens through the
//! same store handle that performed the checks, so callers wrap each
//! operation in one transaction.

use rand::distributions::Alphanumeric;
use rand::Rng;
use thiserror::Error;

use super::helpers::{load_group_access, lock_group_access, AccessError};
use super::models::{GroupAction, GroupRole, PermissionError, ResourceKind};
use super::store::ResourceStore;
use crate::auth::Principal;
use crate::db::{GroupMembership, Id, MembershipStatus};

/// Length of group, membership and live event invitation tokens.
pub const INVITATION_TOKEN_LEN: usize = 16;

/// Membership lifecycle failures.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Cannot change a membership status to pending")]
    ToPending,

    #[error("Membership already has specified status!")]
    Unchanged,

    #[error("Membership has already been requested")]
    AlreadyRequested,

    #[error("User is already a member of this group")]
    AlreadyMember,

    #[error("The organizer already belongs to this group")]
    OrganizerMembership,

    #[error(transparent)]
    Permission(#[from] PermissionError),

    #[error("Membership store failure")]
    Store(#[from] sqlx::Error),
}

impl From<AccessError> for LifecycleError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Denied(e) => Self::Permission(e),
            AccessError::Store(e) => Self::Store(e),
        }
    }
}

/// Random alphanumeric invitation token.
pub fn generate_invitation_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(INVITATION_TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Check a status transition without touching the store.
///
/// Order: `pending` targets are rejected for everyone, then the actor's
/// authority, then the no-op check.
pub fn check_transition(
    actor_role: GroupRole,
    current: MembershipStatus,
    target: MembershipStatus,
) -> Result<(), LifecycleError> {
    let permitted = match target {
        MembershipStatus::Pending => return Err(LifecycleError::ToPending),
        MembershipStatus::Member => actor_role.is_elevated(),
        MembershipStatus::CoAdmin => actor_role == GroupRole::Organizer,
    };

    if !permitted {
        let reason = if actor_role.belongs() {
            PermissionError::InsufficientRole
        } else {
            PermissionError::NotMember
        };
        return Err(reason.into());
    }

    if current == target {
        return Err(LifecycleError::Unchanged);
    }

    Ok(())
}

/// Move `member_id`'s membership in `group_id` to `target`.
///
/// The actor's and the target's rows are locked before the check, so a
/// concurrent demotion of the actor is seen. The target is updated through
/// the same handle.
#[tracing::instrument(skip(store))]
pub async fn transition_membership<S: ResourceStore>(
    store: &mut S,
    actor: Principal,
    group_id: Id,
    member_id: Id,
    target: MembershipStatus,
) -> Result<GroupMembership, LifecycleError> {
    if target == MembershipStatus::Pending {
        return Err(LifecycleError::ToPending);
    }

    let (access, membership) = lock_group_access(store, actor, group_id, member_id).await?;
    // Only elevated roles learn whether the target membership exists
    access.require(GroupAction::Moderate)?;
    let membership = membership.ok_or(PermissionError::NotFound(ResourceKind::Membership))?;

    check_transition(access.role(), membership.status, target)?;

    let updated = store
        .update_membership_status(membership.id, target, None)
        .await?;

    tracing::info!(
        group_id,
        member_id,
        from = %membership.status,
        to = %target,
        "Membership status changed"
    );

    Ok(updated)
}

/// Request membership in a group. Always creates a `pending` row.
#[tracing::instrument(skip(store))]
pub async fn request_membership<S: ResourceStore>(
    store: &mut S,
    requester: Id,
    group_id: Id,
) -> Result<GroupMembership, LifecycleError> {
    let access = load_group_access(store, Principal::User(requester), group_id).await?;

    if access.role() == GroupRole::Organizer {
        return Err(LifecycleError::OrganizerMembership);
    }

    if let Some(existing) = &access.membership {
        return Err(match existing.status {
            MembershipStatus::Pending => LifecycleError::AlreadyRequested,
            MembershipStatus::Member | MembershipStatus::CoAdmin => LifecycleError::AlreadyMember,
        });
    }

    // A concurrent request from the same user loses on the unique pair
    let token = generate_invitation_token();
    store
        .insert_membership(group_id, requester, MembershipStatus::Pending, &token)
        .await?
        .ok_or(LifecycleError::AlreadyRequested)
}

/// Redeem the group's invitation code.
///
/// A pending request is promoted to `member`; anyone else becomes a
/// `member` directly. The membership records the redeemed code.
#[tracing::instrument(skip(store, code))]
pub async fn redeem_invitation<S: ResourceStore>(
    store: &mut S,
    user_id: Id,
    group_id: Id,
    code: &str,
) -> Result<GroupMembership, LifecycleError> {
    let access = load_group_access(store, Principal::User(user_id), group_id).await?;

    if access.role() == GroupRole::Organizer {
        return Err(LifecycleError::OrganizerMembership);
    }

    if code != access.group.invitation_code {
        return Err(PermissionError::InvalidInvitation.into());
    }

    match store.lock_membership(group_id, user_id).await? {
        Some(existing) if existing.status == MembershipStatus::Pending => Ok(store
            .update_membership_status(existing.id, MembershipStatus::Member, Some(code))
            .await?),
        Some(_) => Err(LifecycleError::AlreadyMember),
        None => store
            .insert_membership(group_id, user_id, MembershipStatus::Member, code)
            .await?
            .ok_or(LifecycleError::AlreadyMember),
    }
}

/// Remove a membership: leave, reject a request, or kick.
///
/// Anyone may remove their own membership. The organizer may remove anyone.
/// Co-admins may remove pending requests and members, not other co-admins.
#[tracing::instrument(skip(store))]
pub async fn remove_membership<S: ResourceStore>(
    store: &mut S,
    actor: Principal,
    group_id: Id,
    member_id: Id,
) -> Result<GroupMembership, LifecycleError> {
    let (access, membership) = lock_group_access(store, actor, group_id, member_id).await?;

    let leaving = actor.is(member_id);
    if !leaving {
        access.require(GroupAction::Moderate)?;
    }

    let membership = membership.ok_or(PermissionError::NotFound(ResourceKind::Membership))?;

    if !leaving
        && access.role() == GroupRole::CoAdmin
        && membership.status == MembershipStatus::CoAdmin
    {
        return Err(PermissionError::InsufficientRole.into());
    }

    store.delete_membership(membership.id).await?;
    tracing::info!(group_id, member_id, leaving, "Membership removed");

    Ok(membership)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::memory::MemoryStore;
    use crate::permissions::resolver::decide_group_action;

    const GROUP: Id = 10;
    const ORGANIZER: Id = 1;
    const CO_ADMIN: Id = 2;
    const MEMBER: Id = 3;
    const PENDING: Id = 4;
    const OUTSIDER: Id = 5;

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.add_group(GROUP, ORGANIZER, true);
        store.add_membership(GROUP, CO_ADMIN, MembershipStatus::CoAdmin);
        store.add_membership(GROUP, MEMBER, MembershipStatus::Member);
        store.add_membership(GROUP, PENDING, MembershipStatus::Pending);
        store.add_user(OUTSIDER);
        store
    }

    fn status_of(store: &MemoryStore, member_id: Id) -> Option<MembershipStatus> {
        store
            .memberships
            .iter()
            .find(|m| m.group_id == GROUP && m.member_id == member_id)
            .map(|m| m.status)
    }

    #[test]
    fn test_check_transition_to_pending_always_rejected() {
        for role in [
            GroupRole::Organizer,
            GroupRole::CoAdmin,
            GroupRole::Member,
            GroupRole::Pending,
            GroupRole::Outsider,
        ] {
            for current in [
                MembershipStatus::Pending,
                MembershipStatus::Member,
                MembershipStatus::CoAdmin,
            ] {
                assert!(matches!(
                    check_transition(role, current, MembershipStatus::Pending),
                    Err(LifecycleError::ToPending)
                ));
            }
        }
    }

    #[test]
    fn test_check_transition_guards() {
        use MembershipStatus::{CoAdmin, Member, Pending};

        assert!(check_transition(GroupRole::CoAdmin, Pending, Member).is_ok());
        assert!(check_transition(GroupRole::Organizer, Pending, CoAdmin).is_ok());
        assert!(check_transition(GroupRole::Organizer, CoAdmin, Member).is_ok());
        assert!(matches!(
            check_transition(GroupRole::CoAdmin, Member, CoAdmin),
            Err(LifecycleError::Permission(PermissionError::InsufficientRole))
        ));
        assert!(matches!(
            check_transition(GroupRole::Member, Pending, Member),
            Err(LifecycleError::Permission(PermissionError::InsufficientRole))
        ));
        assert!(matches!(
            check_transition(GroupRole::Outsider, Pending, Member),
            Err(LifecycleError::Permission(PermissionError::NotMember))
        ));
        // Same status is a rejected no-op, even for the organizer
        for status in [Member, CoAdmin] {
            assert!(matches!(
                check_transition(GroupRole::Organizer, status, status),
                Err(LifecycleError::Unchanged)
            ));
        }
    }

    #[test]
    fn test_generated_tokens() {
        let token = generate_invitation_token();
        assert_eq!(token.len(), INVITATION_TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, generate_invitation_token());
    }

    #[tokio::test]
    async fn test_private_group_join_scenario() {
        let mut store = store();

        let facts = load_group_access(&mut store, Principal::User(OUTSIDER), GROUP)
            .await
            .unwrap()
            .facts();
        assert!(!decide_group_action(Principal::User(OUTSIDER), &facts, GroupAction::ViewGroup)
            .is_allowed());

        let requested = request_membership(&mut store, OUTSIDER, GROUP).await.unwrap();
        assert_eq!(requested.status, MembershipStatus::Pending);

        let approved = transition_membership(
            &mut store,
            Principal::User(ORGANIZER),
            GROUP,
            OUTSIDER,
            MembershipStatus::Member,
        )
        .await
        .unwrap();
        assert_eq!(approved.status, MembershipStatus::Member);

        let facts = load_group_access(&mut store, Principal::User(OUTSIDER), GROUP)
            .await
            .unwrap()
            .facts();
        assert!(decide_group_action(Principal::User(OUTSIDER), &facts, GroupAction::ViewGroup)
            .is_allowed());
    }

    #[tokio::test]
    async fn test_co_admin_cannot_promote_to_co_admin() {
        let mut store = store();
        let err = transition_membership(
            &mut store,
            Principal::User(CO_ADMIN),
            GROUP,
            MEMBER,
            MembershipStatus::CoAdmin,
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::Permission(PermissionError::InsufficientRole)
        ));
        assert_eq!(status_of(&store, MEMBER), Some(MembershipStatus::Member));

        // But may approve a pending request
        transition_membership(
            &mut store,
            Principal::User(CO_ADMIN),
            GROUP,
            PENDING,
            MembershipStatus::Member,
        )
        .await
        .unwrap();
        assert_eq!(status_of(&store, PENDING), Some(MembershipStatus::Member));
    }

    #[tokio::test]
    async fn test_transition_ordering() {
        let mut store = store();

        // Pending target wins over a missing group
        let err = transition_membership(
            &mut store,
            Principal::User(ORGANIZER),
            999,
            MEMBER,
            MembershipStatus::Pending,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, LifecycleError::ToPending));

        let err = transition_membership(
            &mut store,
            Principal::User(ORGANIZER),
            999,
            MEMBER,
            MembershipStatus::Member,
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::Permission(PermissionError::NotFound(ResourceKind::Group))
        ));

        // Plain members are denied before the target is looked up
        let err = transition_membership(
            &mut store,
            Principal::User(MEMBER),
            GROUP,
            999,
            MembershipStatus::Member,
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::Permission(PermissionError::InsufficientRole)
        ));

        let err = transition_membership(
            &mut store,
            Principal::User(ORGANIZER),
            GROUP,
            999,
            MembershipStatus::Member,
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::Permission(PermissionError::NotFound(ResourceKind::Membership))
        ));

        let err = transition_membership(
            &mut store,
            Principal::User(ORGANIZER),
            GROUP,
            MEMBER,
            MembershipStatus::Member,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, LifecycleError::Unchanged));
    }

    #[tokio::test]
    async fn test_demoted_co_admin_loses_authority() {
        let mut store = store();
        store.add_membership(GROUP, 6, MembershipStatus::CoAdmin);

        transition_membership(
            &mut store,
            Principal::User(6),
            GROUP,
            CO_ADMIN,
            MembershipStatus::Member,
        )
        .await
        .unwrap();
        // Both rows were locked, lower member id first
        assert_eq!(store.locked, vec![CO_ADMIN, 6]);

        let err = transition_membership(
            &mut store,
            Principal::User(CO_ADMIN),
            GROUP,
            6,
            MembershipStatus::Member,
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::Permission(PermissionError::InsufficientRole)
        ));
        assert_eq!(status_of(&store, 6), Some(MembershipStatus::CoAdmin));

        let err = remove_membership(&mut store, Principal::User(CO_ADMIN), GROUP, MEMBER)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::Permission(PermissionError::InsufficientRole)
        ));
        assert_eq!(status_of(&store, MEMBER), Some(MembershipStatus::Member));
    }

    #[tokio::test]
    async fn test_repeat_requests_are_distinguished() {
        let mut store = store();

        assert!(matches!(
            request_membership(&mut store, PENDING, GROUP).await,
            Err(LifecycleError::AlreadyRequested)
        ));
        assert!(matches!(
            request_membership(&mut store, MEMBER, GROUP).await,
            Err(LifecycleError::AlreadyMember)
        ));
        assert!(matches!(
            request_membership(&mut store, CO_ADMIN, GROUP).await,
            Err(LifecycleError::AlreadyMember)
        ));
        assert!(matches!(
            request_membership(&mut store, ORGANIZER, GROUP).await,
            Err(LifecycleError::OrganizerMembership)
        ));

        request_membership(&mut store, OUTSIDER, GROUP).await.unwrap();
        assert!(matches!(
            request_membership(&mut store, OUTSIDER, GROUP).await,
            Err(LifecycleError::AlreadyRequested)
        ));
        assert_eq!(store.membership_count(GROUP, OUTSIDER), 1);
    }

    #[tokio::test]
    async fn test_redeem_invitation() {
        let mut store = store();

        assert!(matches!(
            redeem_invitation(&mut store, OUTSIDER, GROUP, "WRONGCODE0000000").await,
            Err(LifecycleError::Permission(PermissionError::InvalidInvitation))
        ));
        assert_eq!(store.membership_count(GROUP, OUTSIDER), 0);

        let joined = redeem_invitation(&mut store, OUTSIDER, GROUP, "GROUPCODE0000000")
            .await
            .unwrap();
        assert_eq!(joined.status, MembershipStatus::Member);
        assert_eq!(joined.invitation, "GROUPCODE0000000");

        let promoted = redeem_invitation(&mut store, PENDING, GROUP, "GROUPCODE0000000")
            .await
            .unwrap();
        assert_eq!(promoted.status, MembershipStatus::Member);
        assert_eq!(store.membership_count(GROUP, PENDING), 1);

        assert!(matches!(
            redeem_invitation(&mut store, MEMBER, GROUP, "GROUPCODE0000000").await,
            Err(LifecycleError::AlreadyMember)
        ));
    }

    #[tokio::test]
    async fn test_remove_membership_rules() {
        let mut store = store();

        // Co-admin cannot kick another co-admin
        store.add_membership(GROUP, 6, MembershipStatus::CoAdmin);
        assert!(matches!(
            remove_membership(&mut store, Principal::User(CO_ADMIN), GROUP, 6).await,
            Err(LifecycleError::Permission(PermissionError::InsufficientRole))
        ));

        // Members cannot kick anyone
        assert!(matches!(
            remove_membership(&mut store, Principal::User(MEMBER), GROUP, PENDING).await,
            Err(LifecycleError::Permission(PermissionError::InsufficientRole))
        ));

        // Co-admin rejects a pending request
        remove_membership(&mut store, Principal::User(CO_ADMIN), GROUP, PENDING)
            .await
            .unwrap();
        assert_eq!(status_of(&store, PENDING), None);

        // Co-admin can leave on their own
        remove_membership(&mut store, Principal::User(6), GROUP, 6)
            .await
            .unwrap();
        assert_eq!(status_of(&store, 6), None);

        // Organizer removes a co-admin
        remove_membership(&mut store, Principal::User(ORGANIZER), GROUP, CO_ADMIN)
            .await
            .unwrap();
        assert_eq!(status_of(&store, CO_ADMIN), None);

        assert!(matches!(
            remove_membership(&mut store, Principal::User(ORGANIZER), GROUP, OUTSIDER).await,
            Err(LifecycleError::Permission(PermissionError::NotFound(
                ResourceKind::Membership
            )))
        ));
    }
}
