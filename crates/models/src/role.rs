use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Permission {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Well-known system roles
pub mod names {
    pub const USER: &str = "User";
    pub const ADMIN: &str = "Admin";
}

/// Well-known permissions
pub mod permissions {
    pub const ORG_CREATE: &str = "org:create";
}

/// Grantor recorded for grants made by the application itself
pub const SYSTEM_GRANTOR: &str = "system";
