use crate::error::Result;
use todo_models::Role;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct RoleRepository {
    pool: PgPool,
}

impl RoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the role if it does not exist yet and return it
    pub async fn ensure_role(&self, name: &str, description: Option<&str>) -> Result<Role> {
        let role = sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (name, description)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;

        Ok(role)
    }

    /// Create the permission if it does not exist yet, returning its id
    pub async fn ensure_permission(&self, name: &str) -> Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO permissions (name)
            VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// Grant a permission to a role. Granting twice is a no-op; returns
    /// whether a new grant was recorded.
    pub async fn add_permission_to_role(
        &self,
        role_name: &str,
        permission_name: &str,
        granted_by: &str,
    ) -> Result<bool> {
        let role = self.ensure_role(role_name, None).await?;
        let permission_id = self.ensure_permission(permission_name).await?;

        let result = sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission_id, granted_by)
            VALUES ($1, $2, $3)
            ON CONFLICT (role_id, permission_id) DO NOTHING
            "#,
        )
        .bind(role.id)
        .bind(permission_id)
        .bind(granted_by)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Give a user a role. Returns whether a new assignment was recorded.
    pub async fn assign_role(&self, user_id: Uuid, role_name: &str, granted_by: &str) -> Result<bool> {
        let role = self.ensure_role(role_name, None).await?;

        let result = sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id, granted_by)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, role_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(role.id)
        .bind(granted_by)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Names of all roles held by a user
    pub async fn user_role_names(&self, user_id: Uuid) -> Result<Vec<String>> {
        let roles: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT r.name
            FROM roles r
            INNER JOIN user_roles ur ON r.id = ur.role_id
            WHERE ur.user_id = $1
            ORDER BY r.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }

    pub async fn user_has_role(&self, user_id: Uuid, role_name: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1
                FROM roles r
                INNER JOIN user_roles ur ON r.id = ur.role_id
                WHERE ur.user_id = $1 AND r.name = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(role_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Whether any of the user's roles carries the permission
    pub async fn user_has_permission(&self, user_id: Uuid, permission_name: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1
                FROM user_roles ur
                INNER JOIN role_permissions rp ON rp.role_id = ur.role_id
                INNER JOIN permissions p ON p.id = rp.permission_id
                WHERE ur.user_id = $1 AND p.name = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(permission_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
