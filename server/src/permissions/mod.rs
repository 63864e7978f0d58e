//! Authorization layer.
//!
//! - [`store`]: typed lookups against persistence (Membership Store)
//! - [`resolver`]: pure allow/deny decisions (Authorization Engine)
//! - [`filter`]: per-candidate list filtering (Visibility Filter)
//! - [`lifecycle`]: membership state machine
//! - [`helpers`]: load-then-decide conveniences for handlers

pub mod filter;
pub mod helpers;
pub mod lifecycle;
pub mod models;
mod queries;
pub mod resolver;
pub mod store;

#[cfg(test)]
pub(crate) mod memory;

pub use filter::{
    filter_list, GroupListing, HiddenContent, LiveEventListing, MemberListing, VisibilityRule,
};
pub use helpers::{
    authorize_channel, authorize_group, authorize_live_event, load_group_access,
    lock_group_access, AccessError, GroupAccess,
};
pub use lifecycle::{
    check_transition, generate_invitation_token, redeem_invitation, remove_membership,
    request_membership, transition_membership, LifecycleError, INVITATION_TOKEN_LEN,
};
pub use models::{
    Action, ConversationAction, Decision, GroupAction, GroupRole, OwnedAction, PermissionError,
    ResourceKind,
};
pub use resolver::{
    decide, decide_attendance, decide_conversation, decide_group_action, decide_owned_action,
    decide_remove_attendance, decide_view_event, resolve_role, AttendanceGrant, GroupFacts,
    ResourceRef,
};
pub use store::ResourceStore;
