//! API models for request and response payloads

use serde::Serialize;
use uuid::Uuid;

pub mod bookings;
pub mod communities;
pub mod events;
pub mod notifications;
pub mod resources;
pub mod stats;
pub mod users;

/// Public summary of a user embedded in other records
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Treat blank strings from forms the same as missing fields
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
