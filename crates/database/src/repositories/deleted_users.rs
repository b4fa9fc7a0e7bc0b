use crate::error::{DatabaseError, Result};
use todo_models::DeletedUser;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Users removed from the auth store, kept so that applications can clean
/// up the data they hold for them.
#[derive(Clone)]
pub struct DeletedUserRepository {
    pool: PgPool,
}

impl DeletedUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>> {
        Ok(self.pool.begin().await?)
    }

    /// Record the user as deleted (counter at zero) and remove the user row.
    /// Sessions, role assignments and memberships go with it via cascades.
    pub async fn mark_deleted(&self, user_id: Uuid) -> Result<DeletedUser> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query_as::<_, DeletedUser>(
            r#"
            INSERT INTO deleted_users (user_id, username, email)
            SELECT id, username, email FROM users WHERE id = $1
            ON CONFLICT (user_id) DO UPDATE SET deleted_at = deleted_users.deleted_at
            RETURNING *
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DatabaseError::not_found("User", &user_id.to_string()))?;

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(deleted)
    }

    pub async fn find(&self, user_id: Uuid) -> Result<Option<DeletedUser>> {
        let deleted = sqlx::query_as::<_, DeletedUser>(
            "SELECT * FROM deleted_users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(deleted)
    }

    /// Deleted users nobody has cleaned up yet. Rows are locked for the
    /// lifetime of the caller's transaction; rows locked by a concurrent run
    /// are skipped.
    pub async fn pending_cleanup(&self, conn: &mut PgConnection) -> Result<Vec<DeletedUser>> {
        let users = sqlx::query_as::<_, DeletedUser>(
            r#"
            SELECT * FROM deleted_users
            WHERE cleanup_counter = 0
            ORDER BY deleted_at ASC
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .fetch_all(conn)
        .await?;

        Ok(users)
    }

    /// Mark one more application as done with this user's data
    pub async fn increment_counter(&self, conn: &mut PgConnection, user_id: Uuid) -> Result<i32> {
        let counter: i32 = sqlx::query_scalar(
            r#"
            UPDATE deleted_users
            SET cleanup_counter = cleanup_counter + 1
            WHERE user_id = $1
            RETURNING cleanup_counter
            "#,
        )
        .bind(user_id)
        .fetch_one(conn)
        .await?;

        Ok(counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DatabaseConfig, UserRepository};

    #[tokio::test]
    #[ignore] // Only run with database available
    async fn test_mark_deleted_then_cleanup_once() {
        let db = Database::new(DatabaseConfig::from_env()).await.unwrap();
        db.migrate().await.unwrap();

        let users = UserRepository::new(db.pool().clone());
        let suffix = Uuid::new_v4().simple().to_string();
        let user = users
            .create(&format!("gone_{}", &suffix[..8]), &format!("gone_{}@example.com", suffix), "x")
            .await
            .unwrap();

        let repo = DeletedUserRepository::new(db.pool().clone());
        let deleted = repo.mark_deleted(user.id).await.unwrap();
        assert_eq!(deleted.cleanup_counter, 0);
        assert!(users.find_by_id(user.id).await.is_err());
        assert!(repo.find(user.id).await.unwrap().is_some());

        let mut tx = repo.begin().await.unwrap();
        let pending = repo.pending_cleanup(&mut tx).await.unwrap();
        assert!(pending.iter().any(|d| d.user_id == user.id));
        let counter = repo.increment_counter(&mut tx, user.id).await.unwrap();
        assert_eq!(counter, 1);
        tx.commit().await.unwrap();

        let mut tx = repo.begin().await.unwrap();
        let pending = repo.pending_cleanup(&mut tx).await.unwrap();
        assert!(!pending.iter().any(|d| d.user_id == user.id));
        tx.rollback().await.unwrap();
    }
}
