//! Database Models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Integer identifier shared by every persisted entity.
pub type Id = i64;

/// User model.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Id,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Group model.
///
/// The invitation code is only handed out through the dedicated invitation
/// endpoint and never appears in ordinary group payloads.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: Id,
    pub organizer_id: Id,
    pub name: String,
    pub description: String,
    pub private: bool,
    #[serde(skip_serializing)]
    pub invitation_code: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Membership status of a user in a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "membership_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum MembershipStatus {
    Pending,
    Member,
    CoAdmin,
}

impl MembershipStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Member => "member",
            Self::CoAdmin => "co-admin",
        }
    }
}

impl std::fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Group membership model.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMembership {
    pub id: Id,
    pub group_id: Id,
    pub member_id: Id,
    pub status: MembershipStatus,
    #[serde(skip_serializing)]
    pub invitation: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Channel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "channel_type")]
pub enum ChannelType {
    Text,
    Voice,
    Forum,
    Announcements,
}

/// Channel model.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: Id,
    pub group_id: Id,
    pub creator_id: Id,
    pub name: String,
    pub channel_type: ChannelType,
    /// Reserved. Visibility is decided by group membership alone.
    pub private: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Chat message posted in a channel.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelChat {
    pub id: Id,
    pub channel_id: Id,
    pub user_id: Id,
    pub body: String,
    pub visible: bool,
    pub is_edited: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reply to a channel chat.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelChatReply {
    pub id: Id,
    pub channel_chat_id: Id,
    pub user_id: Id,
    pub body: String,
    pub visible: bool,
    pub is_edited: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Photo attached to a channel chat.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelChatPhoto {
    pub id: Id,
    pub channel_chat_id: Id,
    pub user_id: Id,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

/// Live event recurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_repeat", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventRepeat {
    Daily,
    Weekly,
    Monthly,
}

/// Scheduled live event within a group.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveEvent {
    pub id: Id,
    pub group_id: Id,
    pub creator_id: Id,
    pub name: String,
    pub description: String,
    pub repeat: EventRepeat,
    pub private: bool,
    #[serde(skip_serializing)]
    pub private_invitation: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// RSVP of a user to a live event.
///
/// `invitation` records the event token in effect when the grant was made.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub id: Id,
    pub live_event_id: Id,
    pub user_id: Id,
    #[serde(skip_serializing)]
    pub invitation: String,
    pub created_at: DateTime<Utc>,
}

/// Direct-message thread between two users.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: Id,
    pub user1_id: Id,
    pub user2_id: Id,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// Whether the user is one of the two participants.
    #[must_use]
    pub const fn has_participant(&self, user_id: Id) -> bool {
        self.user1_id == user_id || self.user2_id == user_id
    }
}

/// Message inside a conversation.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Id,
    pub conversation_id: Id,
    pub user_id: Id,
    pub content: String,
    pub previous_content: Option<String>,
    pub sent_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Message {
    /// Deletion keeps the old text as history, so a freshly posted message
    /// that reads like the tombstone is not deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.previous_content.is_some() && self.content == DELETED_MESSAGE_TOMBSTONE
    }
}

/// Content written over a message when its author deletes it.
pub const DELETED_MESSAGE_TOMBSTONE: &str = "[ Message Deleted ]";
