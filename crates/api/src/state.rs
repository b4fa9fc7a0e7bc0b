use crate::cleanup::CleanupJob;
use crate::config::{Config, SessionSettings};
use anyhow::{Context, Result};
use axum::extract::FromRef;
use std::sync::Arc;
use std::time::Duration;
use todo_auth::{AuthService, OrganizationService, SessionTokens};
use todo_authz::RoleService;
use todo_cache::Cache;
use todo_database::{Database, RoleRepository, TodoRepository};
use todo_docstore::Collection;
use todo_models::TodoDocument;

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(3600);

/// Everything the session middleware and the `/auth` routes need
#[derive(Clone)]
pub struct AuthState {
    pub auth: AuthService,
    pub orgs: OrganizationService,
    pub roles: RoleService,
    pub cache: Cache,
    pub session: SessionSettings,
}

impl AuthState {
    pub fn new(database: &Database, cache: Cache, jwt_secret: &str, session: SessionSettings) -> Self {
        let roles = RoleService::new(RoleRepository::new(database.pool().clone()), cache.clone());
        let tokens = SessionTokens::new(jwt_secret, session.lifetime());
        let auth = AuthService::new(database, cache.clone(), tokens, roles.clone());
        let orgs = OrganizationService::new(database, roles.clone());

        Self {
            auth,
            orgs,
            roles,
            cache,
            session,
        }
    }

    /// Build the services, create default roles and the configured admin
    pub async fn initialize(database: &Database, cache: Cache, config: &Config) -> Result<Self> {
        let state = Self::new(database, cache, &config.jwt_secret, config.session.clone());

        todo_auth::bootstrap(&state.auth, &state.roles, &config.bootstrap)
            .await
            .context("Failed to bootstrap roles and admin account")?;

        Ok(state)
    }

    /// Periodically drop expired sessions
    pub fn spawn_session_reaper(&self) -> tokio::task::JoinHandle<()> {
        let auth = self.auth.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SESSION_PURGE_INTERVAL);
            loop {
                ticker.tick().await;
                match auth.purge_expired_sessions().await {
                    Ok(0) => {}
                    Ok(n) => tracing::info!("Purged {} expired sessions", n),
                    Err(e) => tracing::warn!("Session purge failed: {}", e),
                }
            }
        })
    }
}

#[derive(Clone)]
pub struct SimpleState {
    pub auth: Arc<AuthState>,
    pub todos: TodoRepository,
}

impl FromRef<SimpleState> for Arc<AuthState> {
    fn from_ref(state: &SimpleState) -> Self {
        state.auth.clone()
    }
}

#[derive(Clone)]
pub struct AdvancedState {
    pub auth: Arc<AuthState>,
    pub todos: Collection<TodoDocument>,
    pub cleanup: CleanupJob,
}

impl FromRef<AdvancedState> for Arc<AuthState> {
    fn from_ref(state: &AdvancedState) -> Self {
        state.auth.clone()
    }
}
