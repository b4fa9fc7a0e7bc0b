use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::net::SocketAddr;
use todo_cache::{rate_limit_key, Cache, CacheError};

#[derive(Debug, Serialize)]
struct RateLimitError {
    error: String,
    message: String,
    retry_after: u64,
}

/// Fixed-window request counter per client
pub struct RateLimiter {
    cache: Cache,
}

impl RateLimiter {
    pub fn new(cache: Cache) -> Self {
        Self { cache }
    }

    /// Count one request. Returns `Some(retry_after_seconds)` once the
    /// window's budget is spent.
    pub async fn check(
        &self,
        scope: &str,
        client: &str,
        max_requests: i64,
        window_seconds: u64,
    ) -> Result<Option<u64>, CacheError> {
        let key = rate_limit_key(scope, client);
        let count = self.cache.incr_with_ttl(&key, window_seconds).await?;

        if count <= max_requests {
            return Ok(None);
        }

        let ttl = self.cache.ttl(&key).await?;
        Ok(Some(retry_after(ttl, window_seconds)))
    }
}

/// Seconds until the window resets; the full window when Redis has no TTL
fn retry_after(ttl: i64, window_seconds: u64) -> u64 {
    if ttl > 0 {
        ttl as u64
    } else {
        window_seconds
    }
}

/// Client IP: the first hop of the proxy headers, else the peer address of
/// the connection
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|h| h.to_str().ok()))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}

/// Peer address recorded by `into_make_service_with_connect_info`
pub fn peer_addr(request: &Request) -> Option<SocketAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}

async fn limit(
    cache: Cache,
    scope: &'static str,
    action: &'static str,
    max_requests: i64,
    window_seconds: u64,
    request: Request,
    next: Next,
) -> Response {
    let ip = client_ip(request.headers(), peer_addr(&request))
        .unwrap_or_else(|| "unknown".to_string());

    match RateLimiter::new(cache)
        .check(scope, &ip, max_requests, window_seconds)
        .await
    {
        Ok(None) => next.run(request).await,
        Ok(Some(retry_after)) => {
            tracing::warn!("Rate limit exceeded for {} from IP: {}", scope, ip);
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(RateLimitError {
                    error: "rate_limit_exceeded".to_string(),
                    message: format!(
                        "Too many {} attempts. Please try again in {} seconds.",
                        action, retry_after
                    ),
                    retry_after,
                }),
            )
                .into_response()
        }
        Err(e) => {
            // Fail open
            tracing::error!("Rate limit check error: {}", e);
            next.run(request).await
        }
    }
}

/// 5 login attempts per 60 seconds per IP
pub async fn rate_limit_login(State(cache): State<Cache>, request: Request, next: Next) -> Response {
    limit(cache, "login", "login", 5, 60, request, next).await
}

/// 3 signups per hour per IP
pub async fn rate_limit_signup(State(cache): State<Cache>, request: Request, next: Next) -> Response {
    limit(cache, "signup", "signup", 3, 3600, request, next).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{HeaderValue, Request as HttpRequest},
        middleware::from_fn_with_state,
        routing::post,
        Router,
    };
    use tower::ServiceExt;

    #[test]
    fn test_client_ip() {
        let peer: SocketAddr = "192.0.2.10:53211".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, None), None);
        assert_eq!(client_ip(&headers, Some(peer)).as_deref(), Some("192.0.2.10"));

        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(client_ip(&headers, Some(peer)).as_deref(), Some("10.0.0.2"));

        headers.insert("x-forwarded-for", HeaderValue::from_static(" 203.0.113.7 , 10.0.0.1"));
        assert_eq!(client_ip(&headers, Some(peer)).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn test_direct_clients_are_told_apart() {
        let headers = HeaderMap::new();
        let a = client_ip(&headers, Some("192.0.2.10:40000".parse().unwrap())).unwrap();
        let b = client_ip(&headers, Some("192.0.2.11:40000".parse().unwrap())).unwrap();

        assert_ne!(rate_limit_key("login", &a), rate_limit_key("login", &b));
    }

    #[test]
    fn test_peer_addr_from_extensions() {
        let addr: SocketAddr = "198.51.100.20:8080".parse().unwrap();
        let request = HttpRequest::builder()
            .extension(ConnectInfo(addr))
            .body(Body::empty())
            .unwrap();
        assert_eq!(peer_addr(&request), Some(addr));

        let request = HttpRequest::builder().body(Body::empty()).unwrap();
        assert_eq!(peer_addr(&request), None);
    }

    #[test]
    fn test_retry_after() {
        assert_eq!(retry_after(42, 60), 42);
        assert_eq!(retry_after(-1, 60), 60);
        assert_eq!(retry_after(0, 3600), 3600);
    }

    #[tokio::test]
    #[ignore] // Only run with Redis available
    async fn test_limiter_blocks_after_budget() {
        let cache = Cache::new(todo_cache::CacheConfig::from_env()).await.unwrap();
        let limiter = RateLimiter::new(cache);
        let client = format!("test-{}", uuid::Uuid::new_v4());

        for _ in 0..3 {
            assert_eq!(limiter.check("test", &client, 3, 60).await.unwrap(), None);
        }
        let blocked = limiter.check("test", &client, 3, 60).await.unwrap();
        assert!(matches!(blocked, Some(s) if s <= 60));
    }

    #[tokio::test]
    #[ignore] // Only run with Redis available
    async fn test_login_limit_is_per_peer() {
        let cache = Cache::new(todo_cache::CacheConfig::from_env()).await.unwrap();
        let app = Router::new()
            .route("/login", post(|| async { StatusCode::OK }))
            .layer(from_fn_with_state(cache, rate_limit_login));

        // Unique addresses keep reruns out of earlier windows
        let n = uuid::Uuid::new_v4().as_u128();
        let subnet = format!("10.{}.{}", (n >> 8) % 256, n % 256);
        let first: SocketAddr = format!("{}.1:1000", subnet).parse().unwrap();
        let second: SocketAddr = format!("{}.2:1000", subnet).parse().unwrap();

        let send = |addr: SocketAddr| {
            let app = app.clone();
            async move {
                let request = HttpRequest::builder()
                    .method("POST")
                    .uri("/login")
                    .extension(ConnectInfo(addr))
                    .body(Body::empty())
                    .unwrap();
                app.oneshot(request).await.unwrap().status()
            }
        };

        for _ in 0..5 {
            assert_eq!(send(first).await, StatusCode::OK);
        }
        assert_eq!(send(first).await, StatusCode::TOO_MANY_REQUESTS);

        // A different client still has its full budget
        assert_eq!(send(second).await, StatusCode::OK);
    }
}
