use crate::error::{AuthzError, Result};
use todo_cache::{permission_cache_key, Cache};
use todo_database::RoleRepository;
use todo_models::role::names;
use uuid::Uuid;

/// Permission answers are cached only briefly so grants take effect quickly
pub const PERMISSION_CACHE_TTL_SECONDS: u64 = 5;

/// Global roles and the permissions they carry
#[derive(Clone)]
pub struct RoleService {
    repo: RoleRepository,
    cache: Cache,
}

impl RoleService {
    pub fn new(repo: RoleRepository, cache: Cache) -> Self {
        Self { repo, cache }
    }

    /// Make sure the built-in roles exist
    pub async fn ensure_default_roles(&self) -> Result<()> {
        self.repo
            .ensure_role(names::USER, Some("Default role for every signed-up user"))
            .await?;
        self.repo
            .ensure_role(names::ADMIN, Some("Full administrative access"))
            .await?;
        Ok(())
    }

    pub async fn add_permission_to_role(
        &self,
        role: &str,
        permission: &str,
        granted_by: &str,
    ) -> Result<()> {
        validate_name("role", role)?;
        validate_name("permission", permission)?;

        let added = self
            .repo
            .add_permission_to_role(role, permission, granted_by)
            .await?;

        if added {
            tracing::info!(role, permission, granted_by, "Permission granted to role");
        } else {
            tracing::debug!(role, permission, "Role already has permission");
        }
        Ok(())
    }

    pub async fn assign_role(&self, user_id: Uuid, role: &str, granted_by: &str) -> Result<()> {
        validate_name("role", role)?;

        if self.repo.assign_role(user_id, role, granted_by).await? {
            tracing::info!(%user_id, role, granted_by, "Role assigned");
        }
        Ok(())
    }

    pub async fn user_roles(&self, user_id: Uuid) -> Result<Vec<String>> {
        Ok(self.repo.user_role_names(user_id).await?)
    }

    pub async fn has_role(&self, user_id: Uuid, role: &str) -> Result<bool> {
        Ok(self.repo.user_has_role(user_id, role).await?)
    }

    /// Whether any of the user's roles carries `permission`
    pub async fn has_permission(&self, user_id: Uuid, permission: &str) -> Result<bool> {
        let cache_key = permission_cache_key(&user_id.to_string(), permission);

        if let Ok(Some(cached)) = self.cache.get::<bool>(&cache_key).await {
            return Ok(cached);
        }

        let allowed = self.repo.user_has_permission(user_id, permission).await?;

        if let Err(e) = self
            .cache
            .set(&cache_key, &allowed, Some(PERMISSION_CACHE_TTL_SECONDS))
            .await
        {
            tracing::warn!("Failed to cache permission check: {}", e);
        }

        Ok(allowed)
    }

    /// Fail with `PermissionDenied` unless the user holds `permission`
    pub async fn require_permission(&self, user_id: Uuid, permission: &str) -> Result<()> {
        if self.has_permission(user_id, permission).await? {
            Ok(())
        } else {
            Err(AuthzError::PermissionDenied(format!(
                "Missing permission '{}'",
                permission
            )))
        }
    }
}

fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() || name.len() > 100 {
        return Err(AuthzError::ValidationError(format!(
            "{} name must be 1 to 100 characters",
            kind
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("role", "User").is_ok());
        assert!(validate_name("permission", "org:create").is_ok());
        assert!(validate_name("role", "").is_err());
        assert!(validate_name("role", "   ").is_err());
        assert!(validate_name("role", &"x".repeat(101)).is_err());
    }

    #[test]
    fn test_permission_denied_message() {
        let err = AuthzError::PermissionDenied("Missing permission 'org:create'".to_string());
        assert_eq!(err.to_string(), "Permission denied: Missing permission 'org:create'");
    }
}
