//! Booking repository

use anyhow::Result;
use campus_common::{BookingSlot, BookingStatus};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::bookings::{BookedResource, Booker, Booking, BookingDetails, NewBooking};

/// Booking repository for database operations
#[derive(Clone)]
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    /// Create a new booking repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Bookings with resource and booker names, ordered by start time
    pub async fn list_bookings(&self, resource_id: Option<Uuid>) -> Result<Vec<BookingDetails>> {
        let rows = sqlx::query(
            r#"
            SELECT b.id, b.resource_id, b.user_id, b.start_time, b.end_time,
                   b.purpose, b.status, b.created_at,
                   r.name AS resource_name,
                   u.id AS booker_id, u.full_name AS booker_name
            FROM bookings b
            LEFT JOIN resources r ON r.id = b.resource_id
            LEFT JOIN users u ON u.id = b.user_id
            WHERE $1::uuid IS NULL OR b.resource_id = $1
            ORDER BY b.start_time ASC NULLS LAST
            "#,
        )
        .bind(resource_id)
        .fetch_all(&self.pool)
        .await?;

        let bookings = rows
            .into_iter()
            .map(|row| {
                let booking = Booking {
                    id: row.get("id"),
                    resource_id: row.get("resource_id"),
                    user_id: row.get("user_id"),
                    start_time: row.get("start_time"),
                    end_time: row.get("end_time"),
                    purpose: row.get("purpose"),
                    status: row.get("status"),
                    created_at: row.get("created_at"),
                };
                let resource = row
                    .get::<Option<String>, _>("resource_name")
                    .map(|name| BookedResource {
                        id: booking.resource_id,
                        name,
                    });
                let user = row.get::<Option<Uuid>, _>("booker_id").map(|id| Booker {
                    id,
                    full_name: row.get("booker_name"),
                });

                BookingDetails {
                    booking,
                    resource,
                    user,
                }
            })
            .collect();

        Ok(bookings)
    }

    /// Fresh snapshot of a resource's bookings as availability slots
    ///
    /// Cancelled rows are filtered out in SQL; rows the resolver cannot use
    /// are dropped by [`Booking::slot`].
    pub async fn slots_for_resource(&self, resource_id: Uuid) -> Result<Vec<BookingSlot>> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT id, resource_id, user_id, start_time, end_time, purpose, status, created_at
            FROM bookings
            WHERE resource_id = $1 AND status <> $2
            ORDER BY start_time ASC NULLS LAST
            "#,
        )
        .bind(resource_id)
        .bind(BookingStatus::Cancelled.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings.iter().filter_map(Booking::slot).collect())
    }

    /// A user's own bookings, latest start first
    pub async fn for_user(&self, user_id: Uuid) -> Result<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT id, resource_id, user_id, start_time, end_time, purpose, status, created_at
            FROM bookings
            WHERE user_id = $1
            ORDER BY start_time DESC NULLS LAST
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    /// Insert a pending booking
    pub async fn create(&self, user_id: Uuid, booking: &NewBooking) -> Result<Booking> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (resource_id, user_id, start_time, end_time, purpose, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, resource_id, user_id, start_time, end_time, purpose, status, created_at
            "#,
        )
        .bind(booking.resource_id)
        .bind(user_id)
        .bind(booking.start_time)
        .bind(booking.end_time)
        .bind(&booking.purpose)
        .bind(BookingStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(booking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::{delete_user, insert_user, pool};
    use chrono::{DateTime, Duration, Utc};

    async fn insert_booking(
        pool: &PgPool,
        resource_id: Uuid,
        user_id: Uuid,
        window: (Option<DateTime<Utc>>, Option<DateTime<Utc>>),
        status: &str,
    ) {
        sqlx::query(
            "INSERT INTO bookings (resource_id, user_id, start_time, end_time, status) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(resource_id)
        .bind(user_id)
        .bind(window.0)
        .bind(window.1)
        .bind(status)
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL"]
    async fn snapshot_skips_cancelled_and_incomplete_rows() {
        let pool = pool().await;
        let repo = BookingRepository::new(pool.clone());
        let user = insert_user(&pool, "organizer").await;
        let resource_id: Uuid = sqlx::query_scalar(
            "INSERT INTO resources (name, resource_type, status) VALUES ('Lab 1', 'lab', 'approved') RETURNING id",
        )
        .fetch_one(&pool)
        .await
        .unwrap();

        let start = Utc::now();
        let end = start + Duration::hours(1);
        insert_booking(&pool, resource_id, user, (Some(start), Some(end)), "confirmed").await;
        insert_booking(&pool, resource_id, user, (Some(start), Some(end)), "cancelled").await;
        insert_booking(&pool, resource_id, user, (None, Some(end)), "pending").await;

        let slots = repo.slots_for_resource(resource_id).await.unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].status, BookingStatus::Confirmed);
        assert_eq!(slots[0].resource_id, resource_id);

        // The listing still shows every row
        assert_eq!(repo.list_bookings(Some(resource_id)).await.unwrap().len(), 3);

        sqlx::query("DELETE FROM resources WHERE id = $1")
            .bind(resource_id)
            .execute(&pool)
            .await
            .unwrap();
        delete_user(&pool, user).await;
    }
}
