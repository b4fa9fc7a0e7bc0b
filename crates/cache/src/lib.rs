pub mod redis_cache;
pub mod error;

pub use redis_cache::{
    Cache, CacheConfig,
    user_cache_key, rate_limit_key, permission_cache_key,
};
pub use error::{CacheError, Result};
