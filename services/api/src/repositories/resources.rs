//! Resource repository

use anyhow::Result;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::resources::{NewResource, Resource, ResourceStatus};

const RESOURCE_COLUMNS: &str = r#"
    id, name, description, resource_type, location, capacity,
    availability_start, availability_end, image_url, status,
    created_by, approved_by, approved_at, created_at
"#;

/// Resource repository for database operations
#[derive(Clone)]
pub struct ResourceRepository {
    pool: PgPool,
}

impl ResourceRepository {
    /// Create a new resource repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resources, newest first; only approved ones unless `include_unapproved`
    pub async fn list(&self, include_unapproved: bool) -> Result<Vec<Resource>> {
        let sql = format!(
            r#"
            SELECT {RESOURCE_COLUMNS}
            FROM resources
            WHERE $1 OR status = 'approved'
            ORDER BY created_at DESC
            "#
        );
        let resources = sqlx::query_as::<_, Resource>(&sql)
            .bind(include_unapproved)
            .fetch_all(&self.pool)
            .await?;

        Ok(resources)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Resource>> {
        let sql = format!("SELECT {RESOURCE_COLUMNS} FROM resources WHERE id = $1");
        let resource = sqlx::query_as::<_, Resource>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(resource)
    }

    /// Insert a resource; an approver marks it approved on creation
    pub async fn create(
        &self,
        created_by: Uuid,
        resource: &NewResource,
        approved_by: Option<Uuid>,
    ) -> Result<Resource> {
        let status = if approved_by.is_some() {
            ResourceStatus::Approved
        } else {
            ResourceStatus::Pending
        };
        let approved_at = approved_by.map(|_| Utc::now());

        let sql = format!(
            r#"
            INSERT INTO resources (
                name, description, resource_type, location, capacity,
                availability_start, availability_end, image_url, status,
                created_by, approved_by, approved_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {RESOURCE_COLUMNS}
            "#
        );
        let resource = sqlx::query_as::<_, Resource>(&sql)
            .bind(&resource.name)
            .bind(&resource.description)
            .bind(&resource.resource_type)
            .bind(&resource.location)
            .bind(resource.capacity)
            .bind(&resource.availability_start)
            .bind(&resource.availability_end)
            .bind(&resource.image_url)
            .bind(status.as_str())
            .bind(created_by)
            .bind(approved_by)
            .bind(approved_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(resource)
    }

    /// Record an approval decision; `None` when the resource does not exist
    pub async fn set_status(
        &self,
        id: Uuid,
        status: ResourceStatus,
        decided_by: Uuid,
    ) -> Result<Option<Resource>> {
        let sql = format!(
            r#"
            UPDATE resources
            SET status = $2, approved_by = $3, approved_at = NOW()
            WHERE id = $1
            RETURNING {RESOURCE_COLUMNS}
            "#
        );
        let resource = sqlx::query_as::<_, Resource>(&sql)
            .bind(id)
            .bind(status.as_str())
            .bind(decided_by)
            .fetch_optional(&self.pool)
            .await?;

        Ok(resource)
    }
}
