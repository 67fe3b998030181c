//! Dashboard and analytics payloads

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::bookings::Booking;

/// Headline counters for the caller's dashboard
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCounters {
    pub upcoming_events: i64,
    pub booked_resources: i64,
    pub communities_joined: i64,
    /// Rendered as a percentage string, e.g. "40%"
    pub resource_usage: String,
}

/// Upcoming event as listed on the dashboard
#[derive(Debug, Clone, FromRow)]
pub struct UpcomingEvent {
    pub id: Uuid,
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub location: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardEvent {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "start_date")]
    pub start_date: DateTime<Utc>,
    pub location: String,
    pub status: String,
    pub is_attending: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingResourceSummary {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardBooking {
    #[serde(flatten)]
    pub booking: Booking,
    pub resource: Option<BookingResourceSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub stats: DashboardCounters,
    pub recent_events: Vec<DashboardEvent>,
    pub user_bookings: Vec<DashboardBooking>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsTotals {
    pub total_events: i64,
    pub total_attendees: i64,
    pub total_bookings: i64,
}

/// Month-over-month changes, in whole percent
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct AnalyticsChanges {
    pub events: i64,
    pub attendees: i64,
    pub bookings: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MonthlyActivity {
    pub month: String,
    pub events: i64,
    pub attendees: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TypeShare {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub stats: AnalyticsTotals,
    pub changes: AnalyticsChanges,
    pub event_data: Vec<MonthlyActivity>,
    pub resource_data: Vec<TypeShare>,
}
