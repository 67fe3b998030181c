//! Booking models

use campus_common::BookingSlot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Booking entity
///
/// Timestamps are nullable in storage; such rows never take part in
/// availability computation.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub resource_id: Uuid,
    pub user_id: Uuid,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub purpose: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn slot(&self) -> Option<BookingSlot> {
        BookingSlot::from_parts(self.resource_id, &self.status, self.start_time, self.end_time)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BookedResource {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Booker {
    pub id: Uuid,
    pub full_name: Option<String>,
}

/// Booking with resource and booker names, for availability listings
#[derive(Debug, Clone, Serialize)]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub resource: Option<BookedResource>,
    pub user: Option<Booker>,
}

/// Query parameters for booking listings
#[derive(Debug, Deserialize)]
pub struct BookingQuery {
    pub resource_id: Option<Uuid>,
}

/// Request for booking creation
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub resource_id: Option<Uuid>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub purpose: Option<String>,
}

/// Validated booking fields ready for insertion
#[derive(Debug)]
pub struct NewBooking {
    pub resource_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub purpose: Option<String>,
}

impl CreateBookingRequest {
    pub fn validate(self) -> Result<NewBooking, String> {
        let (Some(resource_id), Some(start_time), Some(end_time)) =
            (self.resource_id, self.start_time, self.end_time)
        else {
            return Err("Resource, start time and end time are required".to_string());
        };

        if start_time >= end_time {
            return Err("Start time must be before end time".to_string());
        }

        Ok(NewBooking {
            resource_id,
            start_time,
            end_time,
            purpose: self.purpose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 2, hour, 0, 0).unwrap()
    }

    #[test]
    fn booking_window_must_be_forward() {
        let request = CreateBookingRequest {
            resource_id: Some(Uuid::new_v4()),
            start_time: Some(at(11)),
            end_time: Some(at(10)),
            purpose: None,
        };
        assert_eq!(
            request.validate().unwrap_err(),
            "Start time must be before end time"
        );

        let request = CreateBookingRequest {
            resource_id: Some(Uuid::new_v4()),
            start_time: Some(at(10)),
            end_time: Some(at(10)),
            purpose: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn booking_requires_resource() {
        let request = CreateBookingRequest {
            resource_id: None,
            start_time: Some(at(10)),
            end_time: Some(at(11)),
            purpose: Some("Study group".to_string()),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn stored_booking_without_end_has_no_slot() {
        let booking = Booking {
            id: Uuid::new_v4(),
            resource_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            start_time: Some(at(9)),
            end_time: None,
            purpose: None,
            status: "confirmed".to_string(),
            created_at: at(8),
        };
        assert!(booking.slot().is_none());
    }
}
