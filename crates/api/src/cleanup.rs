use serde::{Deserialize, Serialize};
use thiserror::Error;
use todo_database::{DatabaseError, DeletedUserRepository};
use todo_docstore::{Collection, DocStoreError, Filter};
use todo_models::TodoDocument;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("Auth store error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Document store error: {0}")]
    Documents(#[from] DocStoreError),
}

impl From<sqlx::Error> for CleanupError {
    fn from(err: sqlx::Error) -> Self {
        CleanupError::Database(err.into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupDetail {
    pub user_id: Uuid,
    pub todos_deleted: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupReport {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<CleanupDetail>>,
}

impl CleanupReport {
    pub fn nothing_to_do() -> Self {
        Self {
            message: "No users found needing cleanup.".to_string(),
            details: None,
        }
    }

    pub fn processed(details: Vec<CleanupDetail>) -> Self {
        Self {
            message: format!("Cleanup step processed {} users.", details.len()),
            details: Some(details),
        }
    }
}

/// Removes the todos of users deleted from the auth store.
///
/// A deleted user whose counter is still zero has not been cleaned up by
/// this application. One step handles every such user inside a single
/// auth-store transaction; counters are committed only after all document
/// deletions succeeded, and rows held by a concurrent step are skipped.
#[derive(Clone)]
pub struct CleanupJob {
    deleted_users: DeletedUserRepository,
    todos: Collection<TodoDocument>,
}

impl CleanupJob {
    pub fn new(deleted_users: DeletedUserRepository, todos: Collection<TodoDocument>) -> Self {
        Self { deleted_users, todos }
    }

    pub async fn run_step(&self) -> Result<CleanupReport, CleanupError> {
        let mut tx = self.deleted_users.begin().await?;

        let pending = self.deleted_users.pending_cleanup(&mut tx).await?;
        if pending.is_empty() {
            tx.rollback().await?;
            return Ok(CleanupReport::nothing_to_do());
        }

        let mut details = Vec::with_capacity(pending.len());
        for user in pending {
            let todos_deleted = self
                .todos
                .delete_many(&Filter::eq("user_id", user.user_id.to_string()))
                .await?;

            self.deleted_users
                .increment_counter(&mut tx, user.user_id)
                .await?;

            tracing::info!(user_id = %user.user_id, todos_deleted, "Cleaned up deleted user");

            details.push(CleanupDetail {
                user_id: user.user_id,
                todos_deleted,
            });
        }

        tx.commit().await?;

        Ok(CleanupReport::processed(details))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_has_only_a_message() {
        let value = serde_json::to_value(CleanupReport::nothing_to_do()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "message": "No users found needing cleanup." })
        );
    }

    #[test]
    fn test_processed_report() {
        let user_id = Uuid::new_v4();
        let report = CleanupReport::processed(vec![CleanupDetail {
            user_id,
            todos_deleted: 3,
        }]);

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["message"], "Cleanup step processed 1 users.");
        assert_eq!(value["details"][0]["user_id"], user_id.to_string());
        assert_eq!(value["details"][0]["todos_deleted"], 3);
    }
}
