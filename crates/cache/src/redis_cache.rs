use crate::error::Result;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub url: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
        }
    }
}

impl CacheConfig {
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("REDIS_URL").unwrap_or_else(|_| Self::default().url),
        }
    }
}

/// JSON values in Redis. Cloning shares the underlying connection manager.
#[derive(Clone)]
pub struct Cache {
    manager: ConnectionManager,
}

impl Cache {
    pub async fn new(config: CacheConfig) -> Result<Self> {
        let client = Client::open(config.url)?;
        let manager = ConnectionManager::new(client).await?;

        Ok(Self { manager })
    }

    /// Set a value in the cache with optional TTL (seconds)
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl_seconds: Option<u64>,
    ) -> Result<()> {
        let serialized = serde_json::to_string(value)?;
        let mut conn = self.manager.clone();

        match ttl_seconds {
            Some(ttl) => conn.set_ex::<_, _, ()>(key, serialized, ttl).await?,
            None => conn.set::<_, _, ()>(key, serialized).await?,
        }

        Ok(())
    }

    /// Get a value from the cache
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let mut conn = self.manager.clone();
        let value: Option<String> = conn.get(key).await?;

        match value {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    /// Delete a key from the cache
    pub async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.manager.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    /// Increment a counter. A counter without a TTL, whether new or left
    /// behind by a failed `EXPIRE`, gets a fresh `ttl_seconds` window.
    pub async fn incr_with_ttl(&self, key: &str, ttl_seconds: u64) -> Result<i64> {
        let mut conn = self.manager.clone();
        let (value, ttl): (i64, i64) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .ttl(key)
            .query_async(&mut conn)
            .await?;

        if ttl < 0 {
            conn.expire::<_, ()>(key, ttl_seconds as i64).await?;
        }
        Ok(value)
    }

    /// Get TTL of a key (seconds remaining, negative when absent or persistent)
    pub async fn ttl(&self, key: &str) -> Result<i64> {
        let mut conn = self.manager.clone();
        let ttl: i64 = conn.ttl(key).await?;
        Ok(ttl)
    }

    /// Ping Redis to check connection
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.manager.clone();
        redis::cmd("PING").query_async::<()>(&mut conn).await?;
        Ok(())
    }
}

pub fn user_cache_key(user_id: &str) -> String {
    format!("user:{}", user_id)
}

pub fn rate_limit_key(scope: &str, client: &str) -> String {
    format!("ratelimit:{}:{}", scope, client)
}

pub fn permission_cache_key(user_id: &str, permission: &str) -> String {
    format!("authz:{}:{}", user_id, permission)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_helpers() {
        assert_eq!(user_cache_key("42"), "user:42");
        assert_eq!(rate_limit_key("login", "10.0.0.1"), "ratelimit:login:10.0.0.1");
        assert_eq!(permission_cache_key("42", "org:create"), "authz:42:org:create");
    }

    #[tokio::test]
    #[ignore] // Only run with Redis available
    async fn test_set_get_delete() {
        let cache = Cache::new(CacheConfig::from_env()).await.unwrap();
        cache.ping().await.unwrap();

        cache.set("todo_test_key", "test_value", Some(60)).await.unwrap();
        let value: Option<String> = cache.get("todo_test_key").await.unwrap();
        assert_eq!(value, Some("test_value".to_string()));

        cache.delete("todo_test_key").await.unwrap();
        let value: Option<String> = cache.get("todo_test_key").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    #[ignore] // Only run with Redis available
    async fn test_incr_with_ttl() {
        let cache = Cache::new(CacheConfig::from_env()).await.unwrap();
        cache.delete("todo_test_counter").await.unwrap();

        assert_eq!(cache.incr_with_ttl("todo_test_counter", 30).await.unwrap(), 1);
        assert_eq!(cache.incr_with_ttl("todo_test_counter", 30).await.unwrap(), 2);
        let ttl = cache.ttl("todo_test_counter").await.unwrap();
        assert!(ttl > 0 && ttl <= 30);

        cache.delete("todo_test_counter").await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Only run with Redis available
    async fn test_incr_with_ttl_restores_missing_expiry() {
        let cache = Cache::new(CacheConfig::from_env()).await.unwrap();
        let key = "todo_test_counter_without_ttl";

        // A counter stuck without expiry
        cache.set(key, &7, None).await.unwrap();
        assert_eq!(cache.ttl(key).await.unwrap(), -1);

        assert_eq!(cache.incr_with_ttl(key, 30).await.unwrap(), 8);
        let ttl = cache.ttl(key).await.unwrap();
        assert!(ttl > 0 && ttl <= 30);

        cache.delete(key).await.unwrap();
    }
}
