//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, site loading, worker spawning, and Axum
//! server lifecycle.

use crate::application::services::HitTracker;
use crate::config::Config;
use crate::domain::events::RedirectPersistHooks;
use crate::domain::hit_worker::run_hit_worker;
use crate::infrastructure::sites::load_sites;
use crate::routes::app_router;
use crate::state::{AppState, RedirectSettings, Repositories};

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Site configuration
/// - Background hit worker
/// - Periodic integrity check (when configured)
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - The site configuration cannot be loaded
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to migrate")?;

    let sites = Arc::new(load_sites(&config.sites_config)?);
    if sites.is_empty() {
        tracing::warn!(path = %config.sites_config, "No sites configured, only manual redirects to external targets will resolve");
    }

    let repositories = Repositories::postgres(Arc::new(pool));

    let (hit_tx, hit_rx) = mpsc::channel(config.hit_queue_capacity);
    tokio::spawn(run_hit_worker(hit_rx, repositories.redirects.clone()));
    tracing::info!(enabled = config.hit_count_enabled, "Hit worker started");

    let state = AppState::new(
        repositories,
        sites,
        HitTracker::new(config.hit_count_enabled, hit_tx),
        RedirectSettings {
            case_insensitive: config.case_insensitive,
            redirect_by: config.redirect_by.clone(),
        },
        RedirectPersistHooks::new(),
    );

    if config.is_integrity_check_enabled() {
        spawn_integrity_check(
            state.clone(),
            Duration::from_secs(config.integrity_check_interval_seconds),
        );
    }

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Refreshes the integrity status of every rule once per `period`.
fn spawn_integrity_check(state: AppState, period: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            if let Err(e) = state.integrity_service.refresh().await {
                tracing::error!(error = %e, "Integrity check failed");
            }
        }
    });
    tracing::info!(interval_secs = period.as_secs(), "Integrity check scheduled");
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
    }
}
