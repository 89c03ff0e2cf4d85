//! murder-tracker server entry point.
//!
//! Starts the Axum HTTP server with the REST endpoints.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use murder_tracker::api;
use murder_tracker::app_state::AppState;
use murder_tracker::config::{LogFormat, StorageBackend, TrackerConfig};
use murder_tracker::domain::EventBus;
use murder_tracker::persistence::{InMemoryStore, PostgresStore};
use murder_tracker::service::MurderService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = TrackerConfig::from_env()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(
        addr = %config.listen_addr,
        backend = ?config.storage_backend,
        kill_window_start = %config.kill_window.start(),
        kill_window_end = %config.kill_window.end(),
        "starting murder-tracker"
    );

    // Achievement notifications
    let event_bus = EventBus::new(config.event_bus_capacity);
    if event_bus.receiver_count() == 0 {
        tracing::warn!(
            "no achievement subscriber attached; progress recomputation requests are dropped"
        );
    }

    // Build service layer
    let murder_service = match config.storage_backend {
        StorageBackend::Postgres => {
            let store = PostgresStore::connect(&config.postgres_settings())
                .await
                .context("connecting to PostgreSQL")?;
            if config.schema_init_enabled {
                store.init_schema().await.context("creating murder table")?;
            }
            MurderService::from_backend(Arc::new(store), Arc::new(event_bus), config.kill_window)
        }
        StorageBackend::Memory => {
            tracing::warn!(
                "using in-memory storage with no games or players; \
                 seed it through InMemoryStore::insert_game and insert_player, \
                 data is lost on shutdown"
            );
            MurderService::from_backend(
                Arc::new(InMemoryStore::new()),
                Arc::new(event_bus),
                config.kill_window,
            )
        }
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState::new(murder_service));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
