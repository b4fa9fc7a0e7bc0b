use crate::error::Result;
use todo_models::Todo;
use sqlx::PgPool;
use uuid::Uuid;

/// Per-user todos stored next to the auth tables
#[derive(Clone)]
pub struct TodoRepository {
    pool: PgPool,
}

impl TodoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Todo>> {
        let todos = sqlx::query_as::<_, Todo>(
            "SELECT id, content, user_id FROM todos WHERE user_id = $1 ORDER BY id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(todos)
    }

    pub async fn create(&self, user_id: Uuid, content: &str) -> Result<Todo> {
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            INSERT INTO todos (content, user_id)
            VALUES ($1, $2)
            RETURNING id, content, user_id
            "#,
        )
        .bind(content)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(todo)
    }

    /// Delete a todo only if it belongs to `user_id`. Returns whether a row
    /// was removed.
    pub async fn delete_owned(&self, id: i64, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DatabaseConfig, UserRepository};

    #[tokio::test]
    #[ignore] // Only run with database available
    async fn test_delete_owned_ignores_other_users_todos() {
        let db = Database::new(DatabaseConfig::from_env()).await.unwrap();
        db.migrate().await.unwrap();

        let users = UserRepository::new(db.pool().clone());
        let suffix = Uuid::new_v4().simple().to_string();
        let alice = users
            .create(&format!("alice_{}", &suffix[..8]), &format!("alice_{}@example.com", suffix), "x")
            .await
            .unwrap();
        let bob = users
            .create(&format!("bob_{}", &suffix[..8]), &format!("bob_{}@example.com", suffix), "x")
            .await
            .unwrap();

        let todos = TodoRepository::new(db.pool().clone());
        let todo = todos.create(alice.id, "Buy milk").await.unwrap();

        assert!(!todos.delete_owned(todo.id, bob.id).await.unwrap());
        assert_eq!(todos.list_for_user(alice.id).await.unwrap().len(), 1);

        assert!(todos.delete_owned(todo.id, alice.id).await.unwrap());
        assert!(todos.list_for_user(alice.id).await.unwrap().is_empty());

        users.delete(alice.id).await.unwrap();
        users.delete(bob.id).await.unwrap();
    }
}
