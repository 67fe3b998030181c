//! Community, membership and message repository

use anyhow::Result;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use super::joined_user;
use crate::models::communities::{
    Community, CommunityBrief, GENERAL_COMMUNITY, GENERAL_DESCRIPTION, Member, MemberWithUser,
    Message,
};

const COMMUNITY_COLUMNS: &str = r#"
    c.id, c.name, c.description, c.created_by, c.created_at,
    (SELECT COUNT(*) FROM community_members m WHERE m.community_id = c.id) AS member_count
"#;

fn message_from_row(row: &PgRow) -> Message {
    Message {
        id: row.get("id"),
        community_id: row.get("community_id"),
        user_id: row.get("user_id"),
        message: row.get("message"),
        created_at: row.get("created_at"),
        user: joined_user(row),
    }
}

/// Community repository for database operations
#[derive(Clone)]
pub struct CommunityRepository {
    pool: PgPool,
}

impl CommunityRepository {
    /// Create a new community repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All communities, newest first, with member counts
    pub async fn list(&self) -> Result<Vec<Community>> {
        let sql = format!("SELECT {COMMUNITY_COLUMNS} FROM communities c ORDER BY c.created_at DESC");
        let communities = sqlx::query_as::<_, Community>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(communities)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Community>> {
        let sql = format!("SELECT {COMMUNITY_COLUMNS} FROM communities c WHERE c.id = $1");
        let community = sqlx::query_as::<_, Community>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(community)
    }

    pub async fn create(&self, created_by: Uuid, name: &str, description: &str) -> Result<Community> {
        let row = sqlx::query(
            r#"
            INSERT INTO communities (name, description, created_by)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, created_by, created_at
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(Community {
            id: row.get("id"),
            name: row.get("name"),
            description: row.get("description"),
            created_by: row.get("created_by"),
            created_at: row.get("created_at"),
            member_count: 0,
        })
    }

    /// The campus-wide "General" community, if it exists
    pub async fn find_general(&self) -> Result<Option<Community>> {
        let sql = format!("SELECT {COMMUNITY_COLUMNS} FROM communities c WHERE c.name = $1");
        let community = sqlx::query_as::<_, Community>(&sql)
            .bind(GENERAL_COMMUNITY)
            .fetch_optional(&self.pool)
            .await?;

        Ok(community)
    }

    /// Create the "General" community, or return the one a concurrent caller created
    pub async fn create_general(&self, created_by: Uuid) -> Result<Community> {
        sqlx::query(
            r#"
            INSERT INTO communities (name, description, created_by)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) WHERE name = 'General' DO NOTHING
            "#,
        )
        .bind(GENERAL_COMMUNITY)
        .bind(GENERAL_DESCRIPTION)
        .bind(created_by)
        .execute(&self.pool)
        .await?;

        self.find_general()
            .await?
            .ok_or_else(|| anyhow::anyhow!("General community missing after insert"))
    }

    /// Add a member; `None` when the user already belongs to the community
    pub async fn add_member(
        &self,
        community_id: Uuid,
        user_id: Uuid,
        role: &str,
    ) -> Result<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(
            r#"
            INSERT INTO community_members (community_id, user_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (community_id, user_id) DO NOTHING
            RETURNING id, community_id, user_id, role, joined_at
            "#,
        )
        .bind(community_id)
        .bind(user_id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    /// Returns whether a membership was removed
    pub async fn remove_member(&self, community_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM community_members WHERE community_id = $1 AND user_id = $2")
                .bind(community_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn is_member(&self, community_id: Uuid, user_id: Uuid) -> Result<bool> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM community_members WHERE community_id = $1 AND user_id = $2
            ) AS is_member
            "#,
        )
        .bind(community_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("is_member"))
    }

    /// Members of a community, most recent first
    pub async fn members(&self, community_id: Uuid) -> Result<Vec<MemberWithUser>> {
        let rows = sqlx::query(
            r#"
            SELECT m.id, m.community_id, m.user_id, m.role, m.joined_at,
                   u.id AS joined_user_id, u.full_name AS joined_full_name,
                   u.avatar_url AS joined_avatar_url
            FROM community_members m
            LEFT JOIN users u ON u.id = m.user_id
            WHERE m.community_id = $1
            ORDER BY m.joined_at DESC
            "#,
        )
        .bind(community_id)
        .fetch_all(&self.pool)
        .await?;

        let members = rows
            .iter()
            .map(|row| MemberWithUser {
                member: Member {
                    id: row.get("id"),
                    community_id: row.get("community_id"),
                    user_id: row.get("user_id"),
                    role: row.get("role"),
                    joined_at: row.get("joined_at"),
                },
                user: joined_user(row),
            })
            .collect();

        Ok(members)
    }

    /// IDs of the communities a user belongs to
    pub async fn memberships(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        let rows = sqlx::query(
            r#"
            SELECT m.community_id
            FROM community_members m
            JOIN communities c ON c.id = m.community_id
            WHERE m.user_id = $1
            ORDER BY c.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|row| row.get("community_id")).collect())
    }

    /// Messages of a community, oldest first
    pub async fn messages(&self, community_id: Uuid) -> Result<Vec<Message>> {
        let rows = sqlx::query(
            r#"
            SELECT cm.id, cm.community_id, cm.user_id, cm.message, cm.created_at,
                   u.id AS joined_user_id, u.full_name AS joined_full_name,
                   u.avatar_url AS joined_avatar_url
            FROM community_messages cm
            LEFT JOIN users u ON u.id = cm.user_id
            WHERE cm.community_id = $1
            ORDER BY cm.created_at ASC
            "#,
        )
        .bind(community_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(message_from_row).collect())
    }

    pub async fn post_message(
        &self,
        community_id: Uuid,
        user_id: Uuid,
        message: &str,
    ) -> Result<Message> {
        let row = sqlx::query(
            r#"
            WITH inserted AS (
                INSERT INTO community_messages (community_id, user_id, message)
                VALUES ($1, $2, $3)
                RETURNING id, community_id, user_id, message, created_at
            )
            SELECT i.id, i.community_id, i.user_id, i.message, i.created_at,
                   u.id AS joined_user_id, u.full_name AS joined_full_name,
                   u.avatar_url AS joined_avatar_url
            FROM inserted i
            LEFT JOIN users u ON u.id = i.user_id
            "#,
        )
        .bind(community_id)
        .bind(user_id)
        .bind(message)
        .fetch_one(&self.pool)
        .await?;

        Ok(message_from_row(&row))
    }

    /// Returns whether a message was deleted
    pub async fn delete_message(&self, community_id: Uuid, message_id: Uuid) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM community_messages WHERE id = $1 AND community_id = $2")
                .bind(message_id)
                .bind(community_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn briefs(&self, limit: i64) -> Result<Vec<CommunityBrief>> {
        let communities = sqlx::query_as::<_, CommunityBrief>(
            "SELECT name, description FROM communities ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(communities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::communities::MEMBER_ROLE_USER,
        repositories::test_support::{delete_user, insert_user, pool},
    };

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL"]
    async fn concurrent_joins_record_one_membership() {
        let pool = pool().await;
        let repo = CommunityRepository::new(pool.clone());
        let owner = insert_user(&pool, "organizer").await;
        let member = insert_user(&pool, "user").await;
        let community = repo.create(owner, "Chess Club", "Weekly games").await.unwrap();

        let (first, second) = tokio::join!(
            repo.add_member(community.id, member, MEMBER_ROLE_USER),
            repo.add_member(community.id, member, MEMBER_ROLE_USER),
        );
        let joined = [first.unwrap(), second.unwrap()];
        assert_eq!(joined.iter().filter(|m| m.is_some()).count(), 1);

        let again = repo.add_member(community.id, member, MEMBER_ROLE_USER).await.unwrap();
        assert!(again.is_none());

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM community_members WHERE community_id = $1 AND user_id = $2",
        )
        .bind(community.id)
        .bind(member)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 1);
        assert!(repo.is_member(community.id, member).await.unwrap());

        sqlx::query("DELETE FROM communities WHERE id = $1")
            .bind(community.id)
            .execute(&pool)
            .await
            .unwrap();
        delete_user(&pool, member).await;
        delete_user(&pool, owner).await;
    }
}
