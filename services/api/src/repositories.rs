//! Repositories for database operations

use anyhow::Result;
use campus_common::Role;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{guard::RoleLookup, models::UserSummary, models::users::UserProfile};

pub mod bookings;
pub mod communities;
pub mod events;
pub mod notifications;
pub mod resources;
pub mod stats;

pub use bookings::BookingRepository;
pub use communities::CommunityRepository;
pub use events::EventRepository;
pub use notifications::NotificationRepository;
pub use resources::ResourceRepository;
pub use stats::StatsRepository;

/// Reads the `joined_user_*` columns of a `LEFT JOIN users`
pub(crate) fn joined_user(row: &PgRow) -> Option<UserSummary> {
    let id: Option<Uuid> = row.get("joined_user_id");
    id.map(|id| UserSummary {
        id,
        full_name: row.get("joined_full_name"),
        avatar_url: row.get("joined_avatar_url"),
    })
}

/// User repository for database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user profile by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<UserProfile>> {
        let user = sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT id, email, full_name, avatar_url, role, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Stored role of a user
    ///
    /// A missing row and an unrecognised role string both come back as `None`.
    pub async fn find_role(&self, id: Uuid) -> Result<Option<Role>> {
        let row = sqlx::query("SELECT role FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.and_then(|row| Role::parse_lenient(row.get::<&str, _>("role"))))
    }

    /// Update the given profile fields; `None` leaves a field untouched
    pub async fn update_profile(
        &self,
        id: Uuid,
        full_name: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<UserProfile>> {
        let user = sqlx::query_as::<_, UserProfile>(
            r#"
            UPDATE users
            SET full_name = COALESCE($2, full_name),
                email = COALESCE($3, email),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, full_name, avatar_url, role, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(full_name)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Insert or overwrite a user row from signup metadata
    pub async fn upsert_from_metadata(
        &self,
        id: Uuid,
        email: &str,
        full_name: &str,
        role: Role,
    ) -> Result<UserProfile> {
        let user = sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO users (id, email, full_name, role, updated_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (id) DO UPDATE
            SET email = EXCLUDED.email,
                full_name = EXCLUDED.full_name,
                role = EXCLUDED.role,
                updated_at = NOW()
            RETURNING id, email, full_name, avatar_url, role, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(full_name)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }
}

impl RoleLookup for UserRepository {
    async fn find_role(&self, user_id: Uuid) -> Result<Option<Role>> {
        UserRepository::find_role(self, user_id).await
    }
}

/// Helpers for tests that run against a live database (`DATABASE_URL`)
#[cfg(test)]
pub(crate) mod test_support {
    use campus_common::database::{DatabaseConfig, init_pool, run_migrations};
    use sqlx::PgPool;
    use uuid::Uuid;

    pub async fn pool() -> PgPool {
        let config = DatabaseConfig::from_env().unwrap();
        let pool = init_pool(&config).await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    pub async fn insert_user(pool: &PgPool, role: &str) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO users (id, email, full_name, role) VALUES ($1, $2, 'Test User', $3)")
            .bind(id)
            .bind(format!("{id}@campus.test"))
            .bind(role)
            .execute(pool)
            .await
            .unwrap();
        id
    }

    pub async fn delete_user(pool: &PgPool, id: Uuid) {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .unwrap();
    }
}
