use crate::error::{AuthError, Result};
use crate::jwt::{hash_token, SessionTokens};
use crate::password::PasswordHasher;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use todo_authz::RoleService;
use todo_cache::Cache;
use todo_database::{Database, DatabaseError, DeletedUserRepository, SessionRepository, UserRepository};
use todo_models::role::{names, SYSTEM_GRANTOR};
use todo_models::user::{NewUser, UserProfile};
use todo_models::{DeletedUser, NewSession, User};
use uuid::Uuid;
use validator::Validate;

const USER_CACHE_TTL_SECONDS: u64 = 900;

/// Where a login or signup came from, stored on the session
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// A freshly opened session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: UserProfile,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// The caller behind a valid session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub roles: Vec<String>,
}

impl AuthenticatedUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

#[derive(Clone)]
pub struct AuthService {
    pub cache: Cache,
    tokens: SessionTokens,
    roles: RoleService,
    user_repo: UserRepository,
    session_repo: SessionRepository,
    deleted_repo: DeletedUserRepository,
}

impl AuthService {
    pub fn new(db: &Database, cache: Cache, tokens: SessionTokens, roles: RoleService) -> Self {
        let pool = db.pool().clone();

        Self {
            cache,
            tokens,
            roles,
            user_repo: UserRepository::new(pool.clone()),
            session_repo: SessionRepository::new(pool.clone()),
            deleted_repo: DeletedUserRepository::new(pool),
        }
    }

    /// Create an account without opening a session. New accounts get the
    /// `User` role.
    pub async fn create_user(&self, new_user: NewUser) -> Result<User> {
        new_user.validate()?;

        let password_hash = PasswordHasher::hash(&new_user.password)?;

        if self.user_repo.exists(&new_user.username, &new_user.email).await? {
            return Err(AuthError::AlreadyExists(
                "Username or email is already registered".to_string(),
            ));
        }

        let user = self
            .user_repo
            .create(&new_user.username, &new_user.email, &password_hash)
            .await?;

        self.roles
            .assign_role(user.id, names::USER, SYSTEM_GRANTOR)
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User created");

        Ok(user)
    }

    /// Register a new user and log them in
    pub async fn signup(&self, new_user: NewUser, ctx: RequestContext) -> Result<AuthSession> {
        let user = self.create_user(new_user).await?;
        self.open_session(user, ctx).await
    }

    /// Log in with a username or email
    pub async fn login(&self, login: &str, password: &str, ctx: RequestContext) -> Result<AuthSession> {
        let user = match self.user_repo.find_by_login(login.trim()).await? {
            Some(user) => user,
            None => {
                tracing::debug!("Login attempt for unknown account");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let password_hash = user
            .password_hash
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;

        if !PasswordHasher::verify(password, password_hash)? {
            tracing::warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_active {
            return Err(AuthError::UserInactive);
        }

        self.user_repo.update_last_login(user.id).await?;
        self.invalidate_user_cache(user.id).await?;

        tracing::info!(user_id = %user.id, "User logged in");

        self.open_session(user, ctx).await
    }

    /// End the session behind `token`
    pub async fn logout(&self, token: &str) -> Result<()> {
        self.session_repo.delete_by_token(&hash_token(token)).await?;

        // An expired or forged token has no user worth evicting
        if let Ok(claims) = self.tokens.validate(token) {
            if let Ok(user_id) = Uuid::parse_str(&claims.sub) {
                self.invalidate_user_cache(user_id).await?;
            }
        }

        Ok(())
    }

    /// Resolve a session token to its user
    pub async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser> {
        let claims = self.tokens.validate(token)?;

        self.session_repo
            .find_by_token(&hash_token(token))
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound(_) => {
                    AuthError::InvalidToken("Session not found or expired".to_string())
                }
                other => other.into(),
            })?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AuthError::InvalidToken("Malformed subject".to_string()))?;

        let user = self.get_user(user_id).await.map_err(|e| match e {
            AuthError::NotFound(_) => AuthError::InvalidToken("User no longer exists".to_string()),
            other => other,
        })?;

        if !user.is_active {
            return Err(AuthError::UserInactive);
        }

        let roles = self.roles.user_roles(user.id).await?;

        Ok(AuthenticatedUser {
            id: user.id,
            username: user.username,
            email: user.email,
            roles,
        })
    }

    /// Get user by ID with caching
    pub async fn get_user(&self, user_id: Uuid) -> Result<User> {
        let cache_key = todo_cache::user_cache_key(&user_id.to_string());

        if let Some(user) = self.cache.get::<User>(&cache_key).await? {
            return Ok(user);
        }

        let user = self.user_repo.find_by_id(user_id).await?;

        // 15 minutes
        self.cache
            .set(&cache_key, &user, Some(USER_CACHE_TTL_SECONDS))
            .await?;

        Ok(user)
    }

    pub async fn find_by_login(&self, login: &str) -> Result<Option<User>> {
        Ok(self.user_repo.find_by_login(login).await?)
    }

    /// Remove the account. Applications clean up their own data for it
    /// later from the deleted-users table.
    pub async fn delete_user(&self, user_id: Uuid) -> Result<DeletedUser> {
        let deleted = self.deleted_repo.mark_deleted(user_id).await?;

        // Already gone through the cascade; covers rows created in between
        self.session_repo.delete_all_user_sessions(user_id).await?;
        self.invalidate_user_cache(user_id).await?;

        tracing::info!(%user_id, username = %deleted.username, "User deleted");

        Ok(deleted)
    }

    /// Drop expired session rows
    pub async fn purge_expired_sessions(&self) -> Result<u64> {
        Ok(self.session_repo.cleanup_expired().await?)
    }

    async fn open_session(&self, user: User, ctx: RequestContext) -> Result<AuthSession> {
        let (token, expires_at) = self.tokens.issue(&user)?;

        let new_session = NewSession {
            user_id: user.id,
            token_hash: hash_token(&token),
            ip_address: ctx.ip_address,
            user_agent: ctx.user_agent,
            expires_at,
        };

        self.session_repo.create(&new_session).await?;

        Ok(AuthSession {
            user: user.into(),
            token,
            expires_at,
        })
    }

    async fn invalidate_user_cache(&self, user_id: Uuid) -> Result<()> {
        let cache_key = todo_cache::user_cache_key(&user_id.to_string());
        self.cache.delete(&cache_key).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use todo_cache::CacheConfig;
    use todo_database::{DatabaseConfig, RoleRepository};

    #[test]
    fn test_authenticated_user_has_role() {
        let user = AuthenticatedUser {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            roles: vec!["User".to_string(), "Admin".to_string()],
        };

        assert!(user.has_role("Admin"));
        assert!(!user.has_role("admin"));
    }

    async fn service() -> AuthService {
        let db = Database::new(DatabaseConfig::from_env()).await.unwrap();
        db.migrate().await.unwrap();
        let cache = Cache::new(CacheConfig::from_env()).await.unwrap();
        let roles = RoleService::new(RoleRepository::new(db.pool().clone()), cache.clone());
        roles.ensure_default_roles().await.unwrap();
        let tokens = SessionTokens::new("test-secret-key-min-32-characters-long", Duration::hours(1));

        AuthService::new(&db, cache, tokens, roles)
    }

    #[tokio::test]
    #[ignore] // Only run with database and Redis available
    async fn test_signup_login_logout() {
        let auth = service().await;
        let suffix = &Uuid::new_v4().simple().to_string()[..10];
        let username = format!("user_{}", suffix);

        let session = auth
            .signup(
                NewUser {
                    username: username.clone(),
                    email: format!("{}@example.com", username),
                    password: "Secret123".to_string(),
                },
                RequestContext::default(),
            )
            .await
            .unwrap();

        let me = auth.authenticate(&session.token).await.unwrap();
        assert_eq!(me.username, username);
        assert!(me.has_role("User"));

        assert!(matches!(
            auth.login(&username, "Wrong1234", RequestContext::default()).await,
            Err(AuthError::InvalidCredentials)
        ));

        let again = auth
            .login(&username, "Secret123", RequestContext::default())
            .await
            .unwrap();

        auth.logout(&again.token).await.unwrap();
        assert!(auth.authenticate(&again.token).await.is_err());

        // The first session is independent
        assert!(auth.authenticate(&session.token).await.is_ok());

        auth.delete_user(me.id).await.unwrap();
        assert!(auth.authenticate(&session.token).await.is_err());
    }
}
