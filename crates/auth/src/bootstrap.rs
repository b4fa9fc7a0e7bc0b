use crate::error::Result;
use crate::service::AuthService;
use todo_authz::RoleService;
use todo_models::role::{names, SYSTEM_GRANTOR};
use todo_models::NewUser;

/// Initial administrator, taken from the environment
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub admin_username: String,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl BootstrapConfig {
    pub fn from_env() -> Self {
        Self {
            admin_username: std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            admin_email: std::env::var("ADMIN_EMAIL").ok().filter(|v| !v.is_empty()),
            admin_password: std::env::var("ADMIN_PASSWORD").ok().filter(|v| !v.is_empty()),
        }
    }

    /// Email and password, when both are configured
    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        match (&self.admin_email, &self.admin_password) {
            (Some(email), Some(password)) => Some((email.as_str(), password.as_str())),
            _ => None,
        }
    }
}

/// Ensure the built-in roles and, when configured, an administrator account
pub async fn bootstrap(auth: &AuthService, roles: &RoleService, config: &BootstrapConfig) -> Result<()> {
    roles.ensure_default_roles().await?;

    let Some((email, password)) = config.admin_credentials() else {
        tracing::debug!("No admin credentials configured, skipping admin bootstrap");
        return Ok(());
    };

    let admin = match auth.find_by_login(email).await? {
        Some(user) => user,
        None => {
            let user = auth
                .create_user(NewUser {
                    username: config.admin_username.clone(),
                    email: email.to_string(),
                    password: password.to_string(),
                })
                .await?;
            tracing::info!("👤 Created admin account {}", user.username);
            user
        }
    };

    roles.assign_role(admin.id, names::ADMIN, SYSTEM_GRANTOR).await?;
    roles.assign_role(admin.id, names::USER, SYSTEM_GRANTOR).await?;

    Ok(())
}
