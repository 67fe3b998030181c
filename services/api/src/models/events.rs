//! Event and attendee models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::UserSummary;

pub const EVENT_STATUS_ACTIVE: &str = "active";

/// Event with its attendee count aggregated at read time
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: String,
    pub image_url: Option<String>,
    pub status: String,
    pub organizer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub attendee_count: i64,
}

/// Organizer contact shown on the event page
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrganizerSummary {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: Event,
    pub organizer: Option<OrganizerSummary>,
}

/// Request for event creation
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub image_url: Option<String>,
}

/// Validated event fields ready for insertion
#[derive(Debug)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: String,
    pub image_url: Option<String>,
}

impl CreateEventRequest {
    pub fn validate(self) -> Result<NewEvent, String> {
        const MISSING: &str = "Title, start date, end date, and location are required";

        let title = super::non_blank(&self.title).ok_or(MISSING)?.to_string();
        let location = super::non_blank(&self.location).ok_or(MISSING)?.to_string();
        let (Some(start_date), Some(end_date)) = (self.start_date, self.end_date) else {
            return Err(MISSING.to_string());
        };

        if end_date < start_date {
            return Err("End date must not be before start date".to_string());
        }

        let image_url = super::non_blank(&self.image_url).map(str::to_string);
        if let Some(url) = &image_url {
            crate::validation::validate_image_url(url)?;
        }

        Ok(NewEvent {
            title,
            description: self.description,
            start_date,
            end_date,
            location,
            image_url,
        })
    }
}

/// Event fields fed to the chat assistant
#[derive(Debug, Clone, FromRow)]
pub struct EventBrief {
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub location: String,
}

/// Registered user as listed to organizers, contact email included
#[derive(Debug, Clone, Serialize)]
pub struct AttendeeUser {
    #[serde(flatten)]
    pub summary: UserSummary,
    pub email: String,
}

/// Attendee row with the registered user
#[derive(Debug, Clone, Serialize)]
pub struct Attendee {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub registered_at: DateTime<Utc>,
    pub user: Option<AttendeeUser>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request() -> CreateEventRequest {
        CreateEventRequest {
            title: Some("Hackathon".to_string()),
            description: None,
            start_date: Some(Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap()),
            end_date: Some(Utc.with_ymd_and_hms(2025, 4, 1, 17, 0, 0).unwrap()),
            location: Some("Main Hall".to_string()),
            image_url: None,
        }
    }

    #[test]
    fn complete_request_validates() {
        let event = request().validate().unwrap();
        assert_eq!(event.title, "Hackathon");
        assert_eq!(event.location, "Main Hall");
    }

    #[test]
    fn blank_title_is_rejected() {
        let mut req = request();
        req.title = Some("   ".to_string());
        assert_eq!(
            req.validate().unwrap_err(),
            "Title, start date, end date, and location are required"
        );
    }

    #[test]
    fn missing_dates_are_rejected() {
        let mut req = request();
        req.end_date = None;
        assert!(req.validate().is_err());
    }

    #[test]
    fn reversed_dates_are_rejected() {
        let mut req = request();
        std::mem::swap(&mut req.start_date, &mut req.end_date);
        assert_eq!(
            req.validate().unwrap_err(),
            "End date must not be before start date"
        );
    }

    #[test]
    fn attendee_user_carries_email_beside_summary() {
        let user = AttendeeUser {
            summary: UserSummary {
                id: Uuid::new_v4(),
                full_name: Some("Ada Lovelace".to_string()),
                avatar_url: None,
            },
            email: "ada@campus.edu".to_string(),
        };

        let body = serde_json::to_value(&user).unwrap();
        assert_eq!(body["full_name"], "Ada Lovelace");
        assert_eq!(body["email"], "ada@campus.edu");
        assert!(body["avatar_url"].is_null());
    }
}
