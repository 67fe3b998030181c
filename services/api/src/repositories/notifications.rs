//! Read-only queries behind the notification feed

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// A registered event starting soon
#[derive(Debug, Clone, FromRow)]
pub struct EventReminder {
    pub id: Uuid,
    pub title: String,
    pub start_date: DateTime<Utc>,
}

/// One of the caller's bookings starting soon
#[derive(Debug, Clone, FromRow)]
pub struct BookingReminder {
    pub id: Uuid,
    pub resource_id: Uuid,
    pub resource_name: String,
    pub start_time: DateTime<Utc>,
}

/// A message someone else posted in one of the caller's communities
#[derive(Debug, Clone, FromRow)]
pub struct RecentMessage {
    pub id: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub community_id: Uuid,
    pub community_name: String,
    pub sender_name: Option<String>,
}

#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Registered events starting within `[from, until]`
    pub async fn upcoming_events(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<EventReminder>> {
        let events = sqlx::query_as::<_, EventReminder>(
            r#"
            SELECT e.id, e.title, e.start_date
            FROM events e
            JOIN event_attendees a ON a.event_id = e.id
            WHERE a.user_id = $1 AND e.start_date >= $2 AND e.start_date <= $3
            ORDER BY e.start_date ASC
            LIMIT $4
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(until)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Pending or confirmed bookings starting within `[from, until]`
    pub async fn upcoming_bookings(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<BookingReminder>> {
        let bookings = sqlx::query_as::<_, BookingReminder>(
            r#"
            SELECT b.id, b.resource_id, r.name AS resource_name, b.start_time
            FROM bookings b
            JOIN resources r ON r.id = b.resource_id
            WHERE b.user_id = $1
              AND b.status IN ('confirmed', 'pending')
              AND b.start_time >= $2 AND b.start_time <= $3
            ORDER BY b.start_time ASC
            LIMIT $4
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(until)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    pub async fn count_pending_resources(&self) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM resources WHERE status = 'pending'")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Messages from other members of the caller's communities since `since`
    pub async fn recent_messages(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<RecentMessage>> {
        let messages = sqlx::query_as::<_, RecentMessage>(
            r#"
            SELECT cm.id, cm.message, cm.created_at, c.id AS community_id,
                   c.name AS community_name, u.full_name AS sender_name
            FROM community_messages cm
            JOIN community_members m ON m.community_id = cm.community_id AND m.user_id = $1
            JOIN communities c ON c.id = cm.community_id
            JOIN users u ON u.id = cm.user_id
            WHERE cm.user_id <> $1 AND cm.created_at >= $2
            ORDER BY cm.created_at DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }
}
