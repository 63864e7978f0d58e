//! Live Event Type Definitions

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::{EventRepeat, Id, LiveEvent};

/// Live event as returned to clients.
///
/// The private invitation is only included for the event creator and
/// elevated roles.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveEventView {
    #[serde(flatten)]
    pub event: LiveEvent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_invitation: Option<String>,
}

impl LiveEventView {
    pub fn new(event: LiveEvent, reveal_invitation: bool) -> Self {
        let private_invitation = reveal_invitation.then(|| event.private_invitation.clone());
        Self {
            event,
            private_invitation,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLiveEventRequest {
    #[validate(length(min = 1, max = 60, message = "Name must be 1-60 characters"))]
    pub name: String,
    #[validate(length(min = 30, message = "Description must be at least 30 characters"))]
    pub description: String,
    pub repeat: EventRepeat,
    #[serde(default)]
    pub private: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLiveEventRequest {
    #[validate(length(min = 1, max = 60, message = "Name must be 1-60 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 30, message = "Description must be at least 30 characters"))]
    pub description: Option<String>,
    pub repeat: Option<EventRepeat>,
    pub private: Option<bool>,
}

/// RSVP. Without `invitedUserId` the caller registers themselves.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAttendanceRequest {
    pub invited_user_id: Option<Id>,
    #[validate(length(equal = 16, message = "Invitation must be 16 characters"))]
    pub invitation: Option<String>,
}
