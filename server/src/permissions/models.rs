//! Roles, actions and decisions of the authorization engine.

use axum::http::StatusCode;
use thiserror::Error;

use crate::db::MembershipStatus;

/// Effective role of a principal inside one group.
///
/// Variants are ordered from highest to lowest privilege, so `<` means
/// "outranks".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupRole {
    /// Creator of the group. Never needs a membership row.
    Organizer,
    CoAdmin,
    Member,
    /// Requested membership, not yet approved.
    Pending,
    /// No membership row, or anonymous.
    Outsider,
}

impl GroupRole {
    /// Role held by someone with the given membership status.
    #[must_use]
    pub const fn from_status(status: MembershipStatus) -> Self {
        match status {
            MembershipStatus::Pending => Self::Pending,
            MembershipStatus::Member => Self::Member,
            MembershipStatus::CoAdmin => Self::CoAdmin,
        }
    }

    /// Organizer or co-admin.
    #[must_use]
    pub const fn is_elevated(self) -> bool {
        matches!(self, Self::Organizer | Self::CoAdmin)
    }

    /// Organizer, or any membership row regardless of status.
    #[must_use]
    pub const fn belongs(self) -> bool {
        !matches!(self, Self::Outsider)
    }

    /// Organizer or an approved membership (member / co-admin).
    #[must_use]
    pub const fn is_approved(self) -> bool {
        matches!(self, Self::Organizer | Self::CoAdmin | Self::Member)
    }
}

/// Actions scoped to a group and its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupAction {
    /// See the group record itself.
    ViewGroup,
    /// Edit group name, description or visibility.
    UpdateGroup,
    DeleteGroup,
    /// Read channels, chats, replies, photos and live events.
    ViewContent,
    /// Post chats, replies, photos, create live events, RSVP.
    Contribute,
    /// Create, edit and delete channels.
    ManageChannels,
    /// Remove or hide other users' content.
    Moderate,
    /// Read the group's invitation code.
    ViewInvitation,
    /// See membership requests that are still pending.
    ViewPendingMembers,
}

/// Actions on content that has an author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnedAction {
    /// Change the content. Author only, no elevated override.
    Edit,
    /// Change a group-owned record (live event); author or elevated role.
    Manage,
    /// Author or elevated role.
    Delete,
}

/// Actions on a direct-message conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversationAction {
    Read,
    Post,
    Delete,
}

/// Any action the engine can decide on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Group(GroupAction),
    Owned(OwnedAction),
    Conversation(ConversationAction),
}

impl From<GroupAction> for Action {
    fn from(action: GroupAction) -> Self {
        Self::Group(action)
    }
}

impl From<OwnedAction> for Action {
    fn from(action: OwnedAction) -> Self {
        Self::Owned(action)
    }
}

impl From<ConversationAction> for Action {
    fn from(action: ConversationAction) -> Self {
        Self::Conversation(action)
    }
}

/// Kind of a resource, used for not-found reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Group,
    Channel,
    ChannelChat,
    ChannelChatReply,
    ChannelChatPhoto,
    LiveEvent,
    Attendance,
    Membership,
    Conversation,
    Message,
    User,
}

impl ResourceKind {
    /// User-facing not-found message.
    #[must_use]
    pub const fn not_found_message(self) -> &'static str {
        match self {
            Self::Group => "Group couldn't be found",
            Self::Channel => "Channel couldn't be found",
            Self::ChannelChat => "Channel chat couldn't be found",
            Self::ChannelChatReply => "Reply couldn't be found",
            Self::ChannelChatPhoto => "Photo couldn't be found",
            Self::LiveEvent => "Live event couldn't be found",
            Self::Attendance => "Attendance couldn't be found",
            Self::Membership => "Membership between the user and the group does not exist",
            Self::Conversation => "Conversation couldn't be found",
            Self::Message => "Message couldn't be found",
            Self::User => "User couldn't be found",
        }
    }
}

/// Why a request was denied.
///
/// Messages stay terse and never say whether a group-private resource
/// exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PermissionError {
    /// Parent resource is absent. Distinct from a permission denial.
    #[error("{}", .0.not_found_message())]
    NotFound(ResourceKind),

    /// No authenticated principal where one is required.
    #[error("Authentication required")]
    NotAuthenticated,

    /// No membership in the group.
    #[error("Group membership required")]
    NotMember,

    /// Membership exists but the role is too low.
    #[error("Insufficient group privileges")]
    InsufficientRole,

    /// Only the author may do this.
    #[error("Only the author may do this")]
    NotAuthor,

    /// Not one of the two conversation participants.
    #[error("You are not part of this conversation")]
    NotParticipant,

    /// Wrong invitation token for a private resource.
    #[error("Invalid invitation")]
    InvalidInvitation,

    /// Action does not apply to the resource.
    #[error("Forbidden")]
    Forbidden,
}

impl PermissionError {
    /// HTTP status the route layer should answer with.
    #[must_use]
    pub const fn status_hint(self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::NotAuthenticated => StatusCode::UNAUTHORIZED,
            Self::NotMember
            | Self::InsufficientRole
            | Self::NotAuthor
            | Self::NotParticipant
            | Self::InvalidInvitation
            | Self::Forbidden => StatusCode::FORBIDDEN,
        }
    }
}

/// Outcome of an authorization decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(PermissionError),
}

impl Decision {
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Allow if either decision allows; otherwise keep the first denial.
    #[must_use]
    pub const fn or(self, other: Self) -> Self {
        match (self, other) {
            (Self::Allow, _) | (_, Self::Allow) => Self::Allow,
            (deny, _) => deny,
        }
    }

    /// Convert into a `Result` for `?` propagation.
    pub const fn require(self) -> Result<(), PermissionError> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(reason) => Err(reason),
        }
    }
}
