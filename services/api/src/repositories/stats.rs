//! Aggregate queries for the dashboard and analytics views

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{
    bookings::Booking,
    stats::{BookingResourceSummary, DashboardBooking, UpcomingEvent},
};

/// Event statuses counted by analytics
const COUNTED_EVENT_STATUSES: &[&str] = &["active", "past"];
/// Booking statuses counted by analytics
const COUNTED_BOOKING_STATUSES: &[&str] = &["confirmed", "pending", "completed"];

#[derive(Clone)]
pub struct StatsRepository {
    pool: PgPool,
}

impl StatsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn count(&self, sql: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(sql).fetch_one(&self.pool).await?;
        Ok(count)
    }

    pub async fn count_upcoming_events(&self, now: DateTime<Utc>) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM events WHERE start_date >= $1 AND status = 'active'",
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Pending or confirmed bookings that have not ended, optionally for one user
    pub async fn count_active_bookings(
        &self,
        user_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM bookings
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND end_time >= $2
              AND status IN ('confirmed', 'pending')
            "#,
        )
        .bind(user_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn count_memberships(&self, user_id: Uuid) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM community_members WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    pub async fn count_approved_resources(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM resources WHERE status = 'approved'")
            .await
    }

    pub async fn upcoming_events(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<UpcomingEvent>> {
        let events = sqlx::query_as::<_, UpcomingEvent>(
            r#"
            SELECT id, title, start_date, location, status
            FROM events
            WHERE start_date >= $1 AND status = 'active'
            ORDER BY start_date ASC
            LIMIT $2
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Which of `event_ids` the user is registered for
    pub async fn attending(&self, user_id: Uuid, event_ids: &[Uuid]) -> Result<Vec<Uuid>> {
        if event_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT event_id FROM event_attendees WHERE user_id = $1 AND event_id = ANY($2)",
        )
        .bind(user_id)
        .bind(event_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// The user's bookings that have not ended, soonest first
    pub async fn active_bookings(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<DashboardBooking>> {
        let rows = sqlx::query(
            r#"
            SELECT b.id, b.resource_id, b.user_id, b.start_time, b.end_time,
                   b.purpose, b.status, b.created_at,
                   r.name AS resource_name, r.resource_type
            FROM bookings b
            LEFT JOIN resources r ON r.id = b.resource_id
            WHERE b.user_id = $1
              AND b.end_time >= $2
              AND b.status IN ('confirmed', 'pending')
            ORDER BY b.start_time ASC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let bookings = rows
            .into_iter()
            .map(|row| {
                let resource_id: Uuid = row.get("resource_id");
                let resource = row
                    .get::<Option<String>, _>("resource_name")
                    .map(|name| BookingResourceSummary {
                        id: resource_id,
                        name,
                        resource_type: row.get::<Option<String>, _>("resource_type").unwrap_or_default(),
                    });

                DashboardBooking {
                    booking: Booking {
                        id: row.get("id"),
                        resource_id,
                        user_id: row.get("user_id"),
                        start_time: row.get("start_time"),
                        end_time: row.get("end_time"),
                        purpose: row.get("purpose"),
                        status: row.get("status"),
                        created_at: row.get("created_at"),
                    },
                    resource,
                }
            })
            .collect();

        Ok(bookings)
    }

    pub async fn total_events(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE status = ANY($1)")
            .bind(COUNTED_EVENT_STATUSES)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    pub async fn total_attendees(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM event_attendees").await
    }

    pub async fn total_bookings(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE status = ANY($1)")
            .bind(COUNTED_BOOKING_STATUSES)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Start date and attendee count of each counted event since `since`
    pub async fn event_activity_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<(DateTime<Utc>, i64)>> {
        let rows = sqlx::query(
            r#"
            SELECT e.start_date,
                   (SELECT COUNT(*) FROM event_attendees a WHERE a.event_id = e.id) AS attendee_count
            FROM events e
            WHERE e.start_date >= $1 AND e.status = ANY($2)
            ORDER BY e.start_date ASC
            "#,
        )
        .bind(since)
        .bind(COUNTED_EVENT_STATUSES)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| (row.get("start_date"), row.get("attendee_count")))
            .collect())
    }

    /// Type of every approved resource
    pub async fn approved_resource_types(&self) -> Result<Vec<String>> {
        let types: Vec<String> = sqlx::query_scalar(
            "SELECT resource_type FROM resources WHERE status = 'approved' ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(types)
    }

    /// Counted events starting in `[from, until)`; open-ended when `until` is `None`
    pub async fn events_between(
        &self,
        from: DateTime<Utc>,
        until: Option<DateTime<Utc>>,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM events
            WHERE start_date >= $1
              AND ($2::timestamptz IS NULL OR start_date < $2)
              AND status = ANY($3)
            "#,
        )
        .bind(from)
        .bind(until)
        .bind(COUNTED_EVENT_STATUSES)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn registrations_between(
        &self,
        from: DateTime<Utc>,
        until: Option<DateTime<Utc>>,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM event_attendees
            WHERE registered_at >= $1
              AND ($2::timestamptz IS NULL OR registered_at < $2)
            "#,
        )
        .bind(from)
        .bind(until)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn bookings_between(
        &self,
        from: DateTime<Utc>,
        until: Option<DateTime<Utc>>,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM bookings
            WHERE created_at >= $1
              AND ($2::timestamptz IS NULL OR created_at < $2)
              AND status = ANY($3)
            "#,
        )
        .bind(from)
        .bind(until)
        .bind(COUNTED_BOOKING_STATUSES)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
