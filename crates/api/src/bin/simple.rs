// Simple Todo App
// Server-rendered todo list per user, backed by the relational auth store

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use todo_api::{config, routes, shutdown, telemetry, AuthState, Config, SimpleState};
use todo_cache::Cache;
use todo_database::{Database, TodoRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_env();
    telemetry::init_tracing();

    tracing::info!("🚀 Starting Simple Todo App");
    tracing::info!("📦 Version: {}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env("localhost")?;
    tracing::info!("🔌 Server: {}", config.bind_address());

    // Initialize database
    tracing::info!("🗄️  Connecting to database...");
    let database = Database::new(config.database.clone())
        .await
        .context("Failed to connect to database")?;
    database.ping().await.context("Database ping failed")?;
    database.migrate().await.context("Failed to run migrations")?;
    tracing::info!("✅ Database connected");

    // Initialize cache
    tracing::info!("⚡ Connecting to Redis...");
    let cache = Cache::new(config.cache.clone())
        .await
        .context("Failed to connect to Redis")?;
    cache.ping().await.context("Redis ping failed")?;
    tracing::info!("✅ Redis connected");

    let auth = AuthState::initialize(&database, cache, &config).await?;
    tracing::info!("🔑 Auth services initialized");
    auth.spawn_session_reaper();

    let state = SimpleState {
        auth: Arc::new(auth),
        todos: TodoRepository::new(database.pool().clone()),
    };

    let app = routes::simple_router(state);

    tracing::info!("📡 Routes configured:");
    for route in routes::SIMPLE_ROUTES.iter().chain(routes::AUTH_ROUTES) {
        tracing::info!("   {}", route);
    }

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("✅ Server ready at http://{}", addr);
    tracing::info!(
        "👉 Log in or create an account at http://{}/auth/login?return_url=/",
        addr
    );

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown::signal())
        .await
        .context("Server error")?;

    database.close().await;
    tracing::info!("👋 Server stopped");

    Ok(())
}
