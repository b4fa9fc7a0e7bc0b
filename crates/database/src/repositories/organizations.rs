use crate::error::{DatabaseError, Result};
use todo_models::organization_member::roles;
use todo_models::{Organization, OrganizationMember};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct OrganizationRepository {
    pool: PgPool,
}

impl OrganizationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create an organization and make `owner_id` its owner, atomically
    pub async fn create(&self, name: &str, slug: &str, owner_id: Uuid) -> Result<Organization> {
        let mut tx = self.pool.begin().await?;

        let org = sqlx::query_as::<_, Organization>(
            r#"
            INSERT INTO organizations (name, slug, owner_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(slug)
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DatabaseError::from_insert(e, "Organization", "this slug"))?;

        sqlx::query(
            r#"
            INSERT INTO organization_members (user_id, organization_id, role)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(owner_id)
        .bind(org.id)
        .bind(roles::OWNER)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(org)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Organization> {
        let org = sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Organization", &id.to_string()))?;

        Ok(org)
    }

    /// All organizations the user belongs to, oldest membership first
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Organization>> {
        let orgs = sqlx::query_as::<_, Organization>(
            r#"
            SELECT o.*
            FROM organizations o
            INNER JOIN organization_members m ON m.organization_id = o.id
            WHERE m.user_id = $1
            ORDER BY m.joined_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orgs)
    }

    /// Add a user to an organization
    pub async fn add_member(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        role: &str,
    ) -> Result<OrganizationMember> {
        let member = sqlx::query_as::<_, OrganizationMember>(
            r#"
            INSERT INTO organization_members (user_id, organization_id, role)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(organization_id)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_insert(e, "Membership", "this user"))?;

        Ok(member)
    }

    /// Get a specific membership
    pub async fn get_member(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<OrganizationMember>> {
        let member = sqlx::query_as::<_, OrganizationMember>(
            r#"
            SELECT * FROM organization_members
            WHERE user_id = $1 AND organization_id = $2
            "#,
        )
        .bind(user_id)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    /// Check if user is a member of an organization
    pub async fn is_member(&self, user_id: Uuid, organization_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM organization_members
                WHERE user_id = $1 AND organization_id = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
