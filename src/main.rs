use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use motor_telemetry::common::AppState;
use motor_telemetry::config::{Config, Deployment};
use motor_telemetry::notify::LogNotifier;
use motor_telemetry::registry;
use motor_telemetry::relay::HttpRelay;
use motor_telemetry::routes;
use motor_telemetry::store::TelemetryStore;
use motor_telemetry::sync;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration (fail-fast)
    let config = Config::from_env()?;

    // Initialize tracing; JSON lines in production
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,motor_telemetry=debug".into());
    if config.deployment == Deployment::Prod {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting motor-telemetry...");
    tracing::info!(
        deployment = ?config.deployment,
        host = %config.api_host,
        port = config.api_port,
        "Configuration loaded"
    );

    // Connect to database (fail-fast)
    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url).await?;
    tracing::info!("Database connection established");

    // Run migrations
    tracing::info!("Running migrations...");
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Migrations completed");

    let store = TelemetryStore::new(db);

    if config.run_normalization_on_startup
        && let Err(e) = sync::worker::normalize_legacy_tokens(&store).await
    {
        tracing::error!(error = %e, "Failed to normalize legacy telemetry");
    }

    // Collaborators
    let relay = Arc::new(HttpRelay::new(&config)?);
    tracing::info!(base_url = %config.relay_base_url, "Relay client initialized");
    let device_registry = registry::from_config(&config)?;

    let state = AppState::new(store, config.clone(), relay, device_registry, Arc::new(LogNotifier));

    // Spawn background tasks (fire-and-forget, non-blocking)
    tracing::info!("Spawning background tasks...");
    tokio::spawn(sync::scheduler::run_pending_sync(state.clone()));
    tokio::spawn(sync::scheduler::run_retention_sweep(state.clone()));

    // Build router
    let app = routes::build_router(state);

    // Start server with graceful shutdown
    let addr = config.bind_address();
    tracing::info!(address = %addr, "Starting server");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        },
    }
}
