//! Group Type Definitions

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::{Group, Id, MembershipStatus};

// ============================================================================
// Response Types
// ============================================================================

/// Group annotated with the caller's membership status.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupEntry {
    #[serde(flatten)]
    pub group: Group,
    /// Caller's membership status, `null` when none.
    pub membership: Option<MembershipStatus>,
}

/// Group invitation code, for elevated roles.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationResponse {
    pub group_id: Id,
    pub invitation_code: String,
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    #[validate(length(min = 3, max = 60, message = "Name must be 3-60 characters"))]
    pub name: String,
    #[validate(length(min = 50, message = "Description must be at least 50 characters"))]
    pub description: String,
    #[serde(default)]
    pub private: bool,
    #[validate(url(message = "Image must be a valid URL"))]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGroupRequest {
    #[validate(length(min = 3, max = 60, message = "Name must be 3-60 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 50, message = "Description must be at least 50 characters"))]
    pub description: Option<String>,
    pub private: Option<bool>,
    #[validate(url(message = "Image must be a valid URL"))]
    pub image_url: Option<String>,
}

/// Change another user's membership status.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMembershipRequest {
    pub member_id: Id,
    pub status: MembershipStatus,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RedeemInvitationRequest {
    #[validate(length(equal = 16, message = "Invitation code must be 16 characters"))]
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_group_validation() {
        let request: CreateGroupRequest = serde_json::from_value(serde_json::json!({
            "name": "Rustaceans",
            "description": "A place to talk about ownership, borrowing and lifetimes.",
        }))
        .unwrap();
        assert!(!request.private);
        assert!(request.validate().is_ok());

        let request: CreateGroupRequest = serde_json::from_value(serde_json::json!({
            "name": "R",
            "description": "too short",
            "imageUrl": "not a url",
        }))
        .unwrap();
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("description"));
        assert!(fields.contains_key("image_url"));
    }

    #[test]
    fn test_update_membership_request_wire_format() {
        let request: UpdateMembershipRequest =
            serde_json::from_str(r#"{"memberId": 7, "status": "co-admin"}"#).unwrap();
        assert_eq!(request.member_id, 7);
        assert_eq!(request.status, MembershipStatus::CoAdmin);
    }

    #[test]
    fn test_group_entry_hides_invitation_code() {
        let entry = GroupEntry {
            group: Group {
                id: 1,
                organizer_id: 2,
                name: "Rustaceans".to_string(),
                description: "d".repeat(50),
                private: true,
                invitation_code: "SECRETSECRET1234".to_string(),
                image_url: None,
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            },
            membership: Some(MembershipStatus::Pending),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["organizerId"], 2);
        assert_eq!(json["membership"], "pending");
        assert!(json.get("invitationCode").is_none());
    }
}
