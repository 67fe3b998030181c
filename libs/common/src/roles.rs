//! Role model and the permission predicates derived from it
//!
//! Roles are totally ordered: `User < Organizer < Admin`. Every predicate takes
//! an `Option<Role>` because a caller whose record is missing, or whose stored
//! role string is not one of the three known values, must be denied rather
//! than rejected with an error.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A user's role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Organizer,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::User, Role::Organizer, Role::Admin];

    /// Position in the role hierarchy, starting at 1 for `User`
    pub fn rank(self) -> u8 {
        match self {
            Role::User => 1,
            Role::Organizer => 2,
            Role::Admin => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Organizer => "organizer",
            Role::Admin => "admin",
        }
    }

    /// Parse a stored role string, mapping anything unrecognised to `None`
    pub fn parse_lenient(value: &str) -> Option<Role> {
        value.parse().ok()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known role
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "user" => Ok(Role::User),
            "organizer" => Ok(Role::Organizer),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Whether `actual` is at least as capable as `required`
pub fn required_role_satisfied(actual: Option<Role>, required: Role) -> bool {
    actual.is_some_and(|role| role.rank() >= required.rank())
}

/// Create events, resources and communities; book resources
pub fn can_manage_content(role: Option<Role>) -> bool {
    required_role_satisfied(role, Role::Organizer)
}

/// Approve or reject pending resources. Admin exactly, not rank-based.
pub fn can_approve_resources(role: Option<Role>) -> bool {
    role == Some(Role::Admin)
}

pub fn can_view_analytics(role: Option<Role>) -> bool {
    required_role_satisfied(role, Role::User)
}

pub fn can_join_rooms(role: Option<Role>) -> bool {
    required_role_satisfied(role, Role::User)
}

/// A named permission a route can require
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ManageContent,
    ApproveResources,
    ViewAnalytics,
    JoinRooms,
    /// Delete other people's community messages
    ModerateMessages,
}

impl Permission {
    pub fn allows(self, role: Option<Role>) -> bool {
        match self {
            Permission::ManageContent => can_manage_content(role),
            Permission::ApproveResources => can_approve_resources(role),
            Permission::ViewAnalytics => can_view_analytics(role),
            Permission::JoinRooms => can_join_rooms(role),
            Permission::ModerateMessages => role == Some(Role::Admin),
        }
    }

    /// Message shown to a caller who lacks this permission
    pub fn denial_message(self) -> &'static str {
        match self {
            Permission::ManageContent => "Only organizers and admins can perform this action",
            Permission::ApproveResources => "Only admins can approve resources",
            Permission::ViewAnalytics => "You do not have access to analytics",
            Permission::JoinRooms => "You do not have access to rooms",
            Permission::ModerateMessages => "Forbidden: Admins only",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Permission::ManageContent => "manage_content",
            Permission::ApproveResources => "approve_resources",
            Permission::ViewAnalytics => "view_analytics",
            Permission::JoinRooms => "join_rooms",
            Permission::ModerateMessages => "moderate_messages",
        };
        f.write_str(name)
    }
}

/// Every permission flag for a role, as the client renders them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSet {
    pub is_user: bool,
    pub is_organizer: bool,
    pub is_admin: bool,
    pub can_manage_content: bool,
    pub can_approve_resources: bool,
    pub can_view_analytics: bool,
    pub can_join_rooms: bool,
}

impl PermissionSet {
    pub fn for_role(role: Option<Role>) -> Self {
        Self {
            is_user: role == Some(Role::User),
            is_organizer: required_role_satisfied(role, Role::Organizer),
            is_admin: role == Some(Role::Admin),
            can_manage_content: can_manage_content(role),
            can_approve_resources: can_approve_resources(role),
            can_view_analytics: can_view_analytics(role),
            can_join_rooms: can_join_rooms(role),
        }
    }
}
