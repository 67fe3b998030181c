//! Community, membership and message models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::UserSummary;

pub const GENERAL_COMMUNITY: &str = "General";
pub const GENERAL_DESCRIPTION: &str =
    "A general chatroom for all campus members to connect and communicate";

/// Member role given to a community's creator
pub const MEMBER_ROLE_ORGANIZER: &str = "organizer";
pub const MEMBER_ROLE_USER: &str = "user";

/// Community with its member count aggregated at read time
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Community {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub member_count: i64,
}

/// Request for community creation
#[derive(Debug, Deserialize)]
pub struct CreateCommunityRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl CreateCommunityRequest {
    /// Returns trimmed name and description
    pub fn validate(&self) -> Result<(String, String), String> {
        match (super::non_blank(&self.name), super::non_blank(&self.description)) {
            (Some(name), Some(description)) => Ok((name.to_string(), description.to_string())),
            _ => Err("Name and description are required".to_string()),
        }
    }
}

/// Membership row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Member {
    pub id: Uuid,
    pub community_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberWithUser {
    #[serde(flatten)]
    pub member: Member,
    pub user: Option<UserSummary>,
}

/// Answer to an init request when General is already there
#[derive(Debug, Serialize)]
pub struct GeneralExists {
    pub message: &'static str,
    pub community: Community,
}

impl GeneralExists {
    pub fn new(community: Community) -> Self {
        Self {
            message: "General community already exists",
            community,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MembershipsResponse {
    pub memberships: Vec<Uuid>,
}

/// Chat message with its author
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub id: Uuid,
    pub community_id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub user: Option<UserSummary>,
}

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub message: Option<String>,
}

impl PostMessageRequest {
    pub fn validate(&self) -> Result<String, String> {
        super::non_blank(&self.message)
            .map(str::to_string)
            .ok_or_else(|| "Message is required".to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMessageQuery {
    pub message_id: Option<Uuid>,
}

/// Name and description only, as fed to the chat assistant
#[derive(Debug, Clone, FromRow)]
pub struct CommunityBrief {
    pub name: String,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn community_requires_name_and_description() {
        let request = CreateCommunityRequest {
            name: Some(" Chess Club ".to_string()),
            description: Some("".to_string()),
        };
        assert!(request.validate().is_err());

        let request = CreateCommunityRequest {
            name: Some(" Chess Club ".to_string()),
            description: Some("Weekly games".to_string()),
        };
        assert_eq!(
            request.validate().unwrap(),
            ("Chess Club".to_string(), "Weekly games".to_string())
        );
    }

    #[test]
    fn empty_message_is_rejected() {
        let request = PostMessageRequest {
            message: Some("  ".to_string()),
        };
        assert_eq!(request.validate().unwrap_err(), "Message is required");
    }

    #[test]
    fn existing_general_is_wrapped_with_a_message() {
        let community = Community {
            id: Uuid::new_v4(),
            name: GENERAL_COMMUNITY.to_string(),
            description: Some(GENERAL_DESCRIPTION.to_string()),
            created_by: None,
            created_at: Utc::now(),
            member_count: 4,
        };

        let body = serde_json::to_value(GeneralExists::new(community)).unwrap();
        assert_eq!(body["message"], "General community already exists");
        assert_eq!(body["community"]["name"], "General");
        assert_eq!(body["community"]["member_count"], 4);
    }

    #[test]
    fn delete_query_uses_camel_case() {
        let id = Uuid::new_v4();
        let query: DeleteMessageQuery =
            serde_json::from_value(serde_json::json!({ "messageId": id })).unwrap();
        assert_eq!(query.message_id, Some(id));
    }
}
