//! Event and attendee repository

use anyhow::Result;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use super::joined_user;
use crate::models::events::{
    Attendee, AttendeeUser, EVENT_STATUS_ACTIVE, Event, EventBrief, NewEvent, OrganizerSummary,
};

const EVENT_COLUMNS: &str = r#"
    e.id, e.title, e.description, e.start_date, e.end_date, e.location,
    e.image_url, e.status, e.organizer_id, e.created_at,
    (SELECT COUNT(*) FROM event_attendees a WHERE a.event_id = e.id) AS attendee_count
"#;

fn attendee_from_row(row: &PgRow) -> Attendee {
    Attendee {
        id: row.get("id"),
        event_id: row.get("event_id"),
        user_id: row.get("user_id"),
        registered_at: row.get("registered_at"),
        user: joined_user(row).map(|summary| AttendeeUser {
            summary,
            email: row.get("joined_email"),
        }),
    }
}

/// Event repository for database operations
#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    /// Create a new event repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All events, newest first
    pub async fn list(&self) -> Result<Vec<Event>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events e ORDER BY e.created_at DESC");
        let events = sqlx::query_as::<_, Event>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(events)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events e WHERE e.id = $1");
        let event = sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(event)
    }

    pub async fn find_organizer(&self, organizer_id: Uuid) -> Result<Option<OrganizerSummary>> {
        let organizer = sqlx::query_as::<_, OrganizerSummary>(
            "SELECT id, full_name, email FROM users WHERE id = $1",
        )
        .bind(organizer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(organizer)
    }

    /// Insert an active event owned by `organizer_id`
    pub async fn create(&self, organizer_id: Uuid, event: &NewEvent) -> Result<Event> {
        let row = sqlx::query(
            r#"
            INSERT INTO events (title, description, start_date, end_date, location, image_url, status, organizer_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, title, description, start_date, end_date, location, image_url,
                      status, organizer_id, created_at
            "#,
        )
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(&event.location)
        .bind(&event.image_url)
        .bind(EVENT_STATUS_ACTIVE)
        .bind(organizer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Event {
            id: row.get("id"),
            title: row.get("title"),
            description: row.get("description"),
            start_date: row.get("start_date"),
            end_date: row.get("end_date"),
            location: row.get("location"),
            image_url: row.get("image_url"),
            status: row.get("status"),
            organizer_id: row.get("organizer_id"),
            created_at: row.get("created_at"),
            attendee_count: 0,
        })
    }

    /// Attendees of an event, most recent registration first
    pub async fn attendees(&self, event_id: Uuid) -> Result<Vec<Attendee>> {
        let rows = sqlx::query(
            r#"
            SELECT a.id, a.event_id, a.user_id, a.registered_at,
                   u.id AS joined_user_id, u.full_name AS joined_full_name,
                   u.avatar_url AS joined_avatar_url, u.email AS joined_email
            FROM event_attendees a
            LEFT JOIN users u ON u.id = a.user_id
            WHERE a.event_id = $1
            ORDER BY a.registered_at DESC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(attendee_from_row).collect())
    }

    /// Register a user for an event
    ///
    /// Returns `None` when the user was already registered.
    pub async fn register(&self, event_id: Uuid, user_id: Uuid) -> Result<Option<Attendee>> {
        let row = sqlx::query(
            r#"
            WITH inserted AS (
                INSERT INTO event_attendees (event_id, user_id)
                VALUES ($1, $2)
                ON CONFLICT (event_id, user_id) DO NOTHING
                RETURNING id, event_id, user_id, registered_at
            )
            SELECT i.id, i.event_id, i.user_id, i.registered_at,
                   u.id AS joined_user_id, u.full_name AS joined_full_name,
                   u.avatar_url AS joined_avatar_url, u.email AS joined_email
            FROM inserted i
            LEFT JOIN users u ON u.id = i.user_id
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(attendee_from_row))
    }

    /// Returns whether a registration was removed
    pub async fn unregister(&self, event_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM event_attendees WHERE event_id = $1 AND user_id = $2")
            .bind(event_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn briefs(&self, limit: i64) -> Result<Vec<EventBrief>> {
        let events = sqlx::query_as::<_, EventBrief>(
            r#"
            SELECT title, start_date, location
            FROM events
            WHERE status = $1
            ORDER BY start_date ASC
            LIMIT $2
            "#,
        )
        .bind(EVENT_STATUS_ACTIVE)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::{delete_user, insert_user, pool};
    use chrono::{Duration, Utc};

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL"]
    async fn concurrent_registrations_record_one_attendee() {
        let pool = pool().await;
        let repo = EventRepository::new(pool.clone());
        let organizer = insert_user(&pool, "organizer").await;
        let attendee = insert_user(&pool, "user").await;

        let start = Utc::now() + Duration::days(1);
        let event = repo
            .create(
                organizer,
                &NewEvent {
                    title: "Career Fair".to_string(),
                    description: None,
                    start_date: start,
                    end_date: start + Duration::hours(3),
                    location: "Main Hall".to_string(),
                    image_url: None,
                },
            )
            .await
            .unwrap();

        let (first, second) = tokio::join!(
            repo.register(event.id, attendee),
            repo.register(event.id, attendee),
        );
        let registered = [first.unwrap(), second.unwrap()];
        assert_eq!(registered.iter().filter(|a| a.is_some()).count(), 1);
        assert!(repo.register(event.id, attendee).await.unwrap().is_none());

        let attendees = repo.attendees(event.id).await.unwrap();
        assert_eq!(attendees.len(), 1);
        let user = attendees[0].user.as_ref().unwrap();
        assert_eq!(user.email, format!("{attendee}@campus.test"));

        let listed = repo.find_by_id(event.id).await.unwrap().unwrap();
        assert_eq!(listed.attendee_count, 1);

        sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(event.id)
            .execute(&pool)
            .await
            .unwrap();
        delete_user(&pool, attendee).await;
        delete_user(&pool, organizer).await;
    }
}
