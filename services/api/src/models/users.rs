//! User profile models

use campus_common::roles::PermissionSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Stored user profile
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    /// Raw stored value; unknown strings grant nothing
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile plus the permission flags derived from its role
#[derive(Debug, Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub permissions: PermissionSet,
}

/// Request for a profile update
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

/// Response for the role sync operation
#[derive(Debug, Serialize)]
pub struct SyncRoleResponse {
    pub success: bool,
    pub user: UserProfile,
    pub message: String,
}
