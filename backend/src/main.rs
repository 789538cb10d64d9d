//! Stock Movement API - Backend Server
//!
//! Serves inventory movements for many tenants, each with its own database.

use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stock_backend::{
    config::Config, create_app, AppState, InventoryService, TenantRegistry, UploadService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing; JSON lines in production
    let json_logs = std::env::var("STOCK_ENVIRONMENT").as_deref() == Ok("production");
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "stock_server=debug,stock_backend=debug,tower_http=debug,sqlx=warn".into()
            }),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    // Load configuration
    let config = Config::load()?;

    tracing::info!("Starting Stock Movement Server");
    tracing::info!("Environment: {}", config.environment);

    // Create main database connection pool
    tracing::info!("Connecting to main database...");
    let main_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs))
        .connect(&config.database.url)
        .await?;

    tracing::info!("Database connection established");

    // Run migrations in development
    if config.is_development() {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&main_pool).await?;
        tracing::info!("Migrations completed");
    }

    // Create application state
    let tenants = Arc::new(TenantRegistry::new(main_pool, config.database.clone()));
    let state = AppState {
        config: Arc::new(config.clone()),
        inventory: Arc::new(InventoryService::new(tenants.clone())),
        uploads: Arc::new(UploadService::new(config.storage.clone())),
        tenants: tenants.clone(),
    };

    // Build application
    let app = create_app(state);

    // Start server
    let addr = config.bind_address();
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tenants.close().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
