// Advanced Todo Backend
// JSON API over organization-scoped todo documents, with admin cleanup of
// deleted users' data

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use todo_api::cleanup::CleanupJob;
use todo_api::{config, routes, shutdown, telemetry, AdvancedState, AuthState, Config};
use todo_cache::Cache;
use todo_database::{Database, DeletedUserRepository};
use todo_docstore::DocumentStore;
use todo_models::role::{names, permissions, SYSTEM_GRANTOR};
use todo_models::TodoDocument;

const TODO_COLLECTION: &str = "todos";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_env();
    telemetry::init_tracing();

    tracing::info!("🚀 Starting Advanced Todo Backend");
    tracing::info!("📦 Version: {}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env("0.0.0.0")?;
    tracing::info!("🔌 Server: {}", config.bind_address());

    // Initialize auth store
    tracing::info!("🗄️  Connecting to database...");
    let database = Database::new(config.database.clone())
        .await
        .context("Failed to connect to database")?;
    database.ping().await.context("Database ping failed")?;
    database.migrate().await.context("Failed to run migrations")?;
    tracing::info!("✅ Database connected");

    // Initialize document store
    tracing::info!("📄 Connecting to document store...");
    let documents = DocumentStore::connect(config.documents.clone())
        .await
        .context("Failed to connect to document store")?;
    documents.ping().await.context("Document store ping failed")?;
    tracing::info!("✅ Document store connected (database: {})", documents.database());

    // Initialize cache
    tracing::info!("⚡ Connecting to Redis...");
    let cache = Cache::new(config.cache.clone())
        .await
        .context("Failed to connect to Redis")?;
    cache.ping().await.context("Redis ping failed")?;
    tracing::info!("✅ Redis connected");

    let auth = AuthState::initialize(&database, cache, &config).await?;
    auth.roles
        .add_permission_to_role(names::USER, permissions::ORG_CREATE, SYSTEM_GRANTOR)
        .await
        .context("Failed to grant org:create to the User role")?;
    tracing::info!("🔑 Auth services initialized");
    auth.spawn_session_reaper();

    let todos = documents.collection::<TodoDocument>(TODO_COLLECTION);
    let cleanup = CleanupJob::new(DeletedUserRepository::new(database.pool().clone()), todos.clone());

    let state = AdvancedState {
        auth: Arc::new(auth),
        todos,
        cleanup,
    };

    let app = routes::advanced_router(state);

    tracing::info!("📡 Routes configured:");
    for route in routes::ADVANCED_ROUTES.iter().chain(routes::AUTH_ROUTES) {
        tracing::info!("   {}", route);
    }

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("✅ Server ready at http://{}", addr);
    tracing::info!("🌐 Accepting credentialed requests from http://localhost:*");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown::signal())
        .await
        .context("Server error")?;

    database.close().await;
    tracing::info!("👋 Server stopped");

    Ok(())
}
