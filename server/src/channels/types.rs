//! Channel and Chat Type Definitions

use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::db::ChannelType;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateChannelRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: String,
    #[serde(rename = "type")]
    pub channel_type: ChannelType,
    #[serde(default)]
    pub private: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChannelRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub channel_type: Option<ChannelType>,
    pub private: Option<bool>,
}

/// New chat or reply.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateChatRequest {
    #[validate(length(min = 1, max = 2000, message = "Message must be 1-2000 characters"))]
    pub body: String,
}

/// Edit a chat or reply.
///
/// Changing `body` is author-only. Changing `visible` is open to the
/// author and to moderators.
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_update_not_empty"))]
pub struct UpdateChatRequest {
    #[validate(length(min = 1, max = 2000, message = "Message must be 1-2000 characters"))]
    pub body: Option<String>,
    pub visible: Option<bool>,
}

impl UpdateChatRequest {
    pub const fn is_empty(&self) -> bool {
        self.body.is_none() && self.visible.is_none()
    }
}

fn validate_update_not_empty(request: &UpdateChatRequest) -> Result<(), ValidationError> {
    if request.is_empty() {
        return Err(ValidationError::new("empty_update").with_message("Nothing to update".into()));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePhotoRequest {
    #[validate(url(message = "Image must be a valid URL"))]
    pub image_url: String,
}
