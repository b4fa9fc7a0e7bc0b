use anyhow::{bail, Result};
use todo_auth::BootstrapConfig;
use todo_cache::CacheConfig;
use todo_database::DatabaseConfig;
use todo_docstore::DocumentStoreConfig;

pub const DEFAULT_PORT: u16 = 5080;

/// Load variables from `ENV_FILE_PATH` when set, otherwise from `.env` if present
pub fn load_env() {
    match std::env::var("ENV_FILE_PATH") {
        Ok(path) if !path.is_empty() => {
            if let Err(e) = dotenvy::from_path(&path) {
                eprintln!("Could not load env file {}: {}", path, e);
            }
        }
        _ => {
            dotenvy::dotenv().ok();
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub documents: DocumentStoreConfig,
    pub bootstrap: BootstrapConfig,
    pub jwt_secret: String,
    pub session: SessionSettings,
}

impl Config {
    /// `default_host` differs per binary
    pub fn from_env(default_host: &str) -> Result<Self> {
        let jwt_secret = match std::env::var("JWT_SECRET").or_else(|_| std::env::var("SESSION_SECRET")) {
            Ok(secret) if !secret.is_empty() => secret,
            _ => bail!("JWT_SECRET (or SESSION_SECRET) must be set"),
        };

        Ok(Self {
            server_host: std::env::var("SERVER_HOST").unwrap_or_else(|_| default_host.to_string()),
            server_port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            database: DatabaseConfig::from_env(),
            cache: CacheConfig::from_env(),
            documents: DocumentStoreConfig::from_env(),
            bootstrap: BootstrapConfig::from_env(),
            jwt_secret,
            session: SessionSettings::from_env(),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

/// Longest accepted session lifetime, one year
pub const MAX_SESSION_LIFETIME_HOURS: i64 = 24 * 365;

/// How the session token travels in a cookie
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub lifetime_hours: i64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cookie_name: "session_token".to_string(),
            cookie_secure: false,
            lifetime_hours: 168,
        }
    }
}

impl SessionSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cookie_name: std::env::var("SESSION_COOKIE_NAME")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.cookie_name),
            cookie_secure: std::env::var("SESSION_COOKIE_SECURE")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.cookie_secure),
            lifetime_hours: parse_lifetime_hours(
                std::env::var("SESSION_LIFETIME_HOURS").ok().as_deref(),
                defaults.lifetime_hours,
            ),
        }
    }

    /// Lifetime in hours, kept within `1..=MAX_SESSION_LIFETIME_HOURS`
    fn hours(&self) -> i64 {
        self.lifetime_hours.clamp(1, MAX_SESSION_LIFETIME_HOURS)
    }

    pub fn lifetime(&self) -> chrono::Duration {
        chrono::Duration::hours(self.hours())
    }

    /// `Set-Cookie` value carrying `token`
    pub fn set_cookie(&self, token: &str) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.cookie_name,
            token,
            self.hours() * 3600
        );
        if self.cookie_secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// `Set-Cookie` value that removes the session cookie
    pub fn clear_cookie(&self) -> String {
        let mut cookie = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", self.cookie_name);
        if self.cookie_secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Positive hour counts are capped at a year; anything unparsable or
/// non-positive falls back to `default`
fn parse_lifetime_hours(value: Option<&str>, default: i64) -> i64 {
    match value.and_then(|v| v.trim().parse::<i64>().ok()) {
        Some(hours) if hours > 0 => hours.min(MAX_SESSION_LIFETIME_HOURS),
        _ => default,
    }
}
