//! Resource models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Approval lifecycle of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
    Pending,
    Approved,
    Rejected,
}

impl ResourceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceStatus::Pending => "pending",
            ResourceStatus::Approved => "approved",
            ResourceStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for ResourceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ResourceStatus::Pending),
            "approved" => Ok(ResourceStatus::Approved),
            "rejected" => Ok(ResourceStatus::Rejected),
            other => Err(format!("unknown resource status: {other}")),
        }
    }
}

/// Resource entity
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Resource {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub resource_type: String,
    pub location: Option<String>,
    pub capacity: Option<i32>,
    pub availability_start: Option<String>,
    pub availability_end: Option<String>,
    pub image_url: Option<String>,
    pub status: String,
    pub created_by: Option<Uuid>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Request for resource creation
#[derive(Debug, Deserialize)]
pub struct CreateResourceRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub resource_type: Option<String>,
    pub location: Option<String>,
    pub capacity: Option<i32>,
    pub availability_start: Option<String>,
    pub availability_end: Option<String>,
    pub image_url: Option<String>,
}

/// Validated resource fields ready for insertion
#[derive(Debug)]
pub struct NewResource {
    pub name: String,
    pub description: Option<String>,
    pub resource_type: String,
    pub location: Option<String>,
    pub capacity: Option<i32>,
    pub availability_start: Option<String>,
    pub availability_end: Option<String>,
    pub image_url: Option<String>,
}

impl CreateResourceRequest {
    pub fn validate(self) -> Result<NewResource, String> {
        let (Some(name), Some(resource_type)) = (
            super::non_blank(&self.name).map(str::to_string),
            super::non_blank(&self.resource_type).map(str::to_string),
        ) else {
            return Err("Name and resource type are required".to_string());
        };

        if self.capacity.is_some_and(|capacity| capacity < 0) {
            return Err("Capacity must not be negative".to_string());
        }

        let image_url = super::non_blank(&self.image_url).map(str::to_string);
        if let Some(url) = &image_url {
            crate::validation::validate_image_url(url)?;
        }

        Ok(NewResource {
            name,
            description: self.description,
            resource_type,
            location: self.location,
            capacity: self.capacity,
            availability_start: super::non_blank(&self.availability_start).map(str::to_string),
            availability_end: super::non_blank(&self.availability_end).map(str::to_string),
            image_url,
        })
    }
}

/// Request for approving or rejecting a resource
#[derive(Debug, Deserialize)]
pub struct ApproveResourceRequest {
    pub status: Option<String>,
}

impl ApproveResourceRequest {
    /// Only the two terminal decisions are accepted
    pub fn decision(&self) -> Result<ResourceStatus, String> {
        match self.status.as_deref().map(str::parse::<ResourceStatus>) {
            Some(Ok(status @ (ResourceStatus::Approved | ResourceStatus::Rejected))) => Ok(status),
            _ => Err("Invalid status. Must be \"approved\" or \"rejected\"".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_decision_accepts_terminal_states_only() {
        let decide = |status: Option<&str>| {
            ApproveResourceRequest {
                status: status.map(str::to_string),
            }
            .decision()
        };

        assert_eq!(decide(Some("approved")), Ok(ResourceStatus::Approved));
        assert_eq!(decide(Some("rejected")), Ok(ResourceStatus::Rejected));
        assert!(decide(Some("pending")).is_err());
        assert!(decide(Some("APPROVED")).is_err());
        assert!(decide(None).is_err());
    }

    #[test]
    fn resource_requires_name_and_type() {
        let request = CreateResourceRequest {
            name: Some("Lab 3".to_string()),
            description: None,
            resource_type: None,
            location: None,
            capacity: Some(20),
            availability_start: Some("".to_string()),
            availability_end: None,
            image_url: None,
        };

        assert_eq!(
            request.validate().unwrap_err(),
            "Name and resource type are required"
        );
    }

    #[test]
    fn blank_availability_window_is_dropped() {
        let request = CreateResourceRequest {
            name: Some("Lab 3".to_string()),
            description: None,
            resource_type: Some("room".to_string()),
            location: None,
            capacity: Some(20),
            availability_start: Some(" ".to_string()),
            availability_end: Some("18:00".to_string()),
            image_url: None,
        };

        let resource = request.validate().unwrap();
        assert_eq!(resource.availability_start, None);
        assert_eq!(resource.availability_end.as_deref(), Some("18:00"));
    }
}
