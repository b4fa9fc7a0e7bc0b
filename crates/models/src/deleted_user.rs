use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A user removed from the auth store whose application data may still need
/// cleaning up.
///
/// `cleanup_counter` starts at zero; an application bumps it once it has
/// removed everything it stored for the user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DeletedUser {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub deleted_at: DateTime<Utc>,
    pub cleanup_counter: i32,
}

