use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use enviro_db::common::AppState;
use enviro_db::config::Config;
use enviro_db::notify::BroadcastNotifier;
use enviro_db::openaq::OpenAqClient;
use enviro_db::openmeteo::OpenMeteoClient;
use enviro_db::sync;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,enviro_db=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting enviro-db...");

    // Load configuration (fail-fast)
    let config = Config::from_env()?;
    tracing::info!(deployment = ?config.deployment, "Configuration loaded");

    // Connect to database (fail-fast)
    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url).await?;
    tracing::info!("Database connection established");

    // Run migrations
    tracing::info!("Running migrations...");
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Migrations completed");

    // Create upstream clients
    let weather_client = OpenMeteoClient::new(&config);
    tracing::info!("Open-Meteo client initialized");

    // A missing OpenAQ key disables the sensor and readings syncs only;
    // weather sync keeps running without it.
    let openaq_client = match OpenAqClient::new(&config) {
        Ok(client) => {
            tracing::info!("OpenAQ client initialized");
            Some(client)
        }
        Err(e) => {
            tracing::error!(error = %e, "OpenAQ client unavailable");
            None
        }
    };

    let notifier = Arc::new(BroadcastNotifier::default());

    // Create application state
    let state = AppState::new(db, config, weather_client, openaq_client, notifier);

    // Spawn background sync tasks (fire-and-forget, non-blocking)
    tracing::info!("Spawning background sync tasks...");
    tokio::spawn(sync::scheduler::run_weather_sync(state.clone()));
    tokio::spawn(sync::scheduler::run_sensor_discovery(state.clone()));
    tokio::spawn(sync::scheduler::run_readings_sync(state.clone()));

    // Run until shutdown signal
    shutdown_signal().await;

    tracing::info!("Shut down gracefully");
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
