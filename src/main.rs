//! rental-dashboard server entry point.
//!
//! Loads configuration, connects the record store and serves the REST API.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use rental_dashboard::api;
use rental_dashboard::app_state::AppState;
use rental_dashboard::cache::CacheStore;
use rental_dashboard::config::{DashboardConfig, LogFormat, StoreKind};
use rental_dashboard::persistence::{InMemoryRecordStore, PostgresRecordStore, RecordStore};
use rental_dashboard::service::DashboardService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = DashboardConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Plain => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, store = ?config.record_store, "starting rental-dashboard");

    // Build persistence layer
    let store = connect_store(&config).await?;

    // Build service layer
    let cache = Arc::new(CacheStore::new());
    if let Some(every) = config.cache_sweep_interval() {
        cache.spawn_sweeper(every);
    }
    let service = DashboardService::new(store, Arc::clone(&cache))
        .with_default_ttl(config.cache_default_ttl());
    if config.offline_mode {
        service.set_offline_mode(true);
    }

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState::new(service));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

async fn connect_store(config: &DashboardConfig) -> anyhow::Result<Arc<dyn RecordStore>> {
    match config.record_store {
        StoreKind::Memory => {
            tracing::warn!("using the in-memory record store; data is not persisted");
            Ok(Arc::new(InMemoryRecordStore::new()))
        }
        StoreKind::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .min_connections(config.database_min_connections)
                .acquire_timeout(std::time::Duration::from_secs(
                    config.database_connect_timeout_secs,
                ))
                .connect(&config.database_url)
                .await
                .context("connecting to PostgreSQL")?;

            if config.run_migrations {
                sqlx::migrate!("./migrations")
                    .run(&pool)
                    .await
                    .context("running migrations")?;
                tracing::info!("migrations applied");
            }

            Ok(Arc::new(PostgresRecordStore::new(pool)))
        }
    }
}
