use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Membership of a user in an organization
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrganizationMember {
    pub id: Uuid,
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub role: String,
    pub joined_at: DateTime<Utc>,
}

/// Request to add a user to an organization, by username or email
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddOrganizationMember {
    #[validate(length(min = 1, max = 255))]
    pub login: String,
}

/// Organization-scoped roles
pub mod roles {
    pub const OWNER: &str = "owner";
    pub const MEMBER: &str = "member";
}
