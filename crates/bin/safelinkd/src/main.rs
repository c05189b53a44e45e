//! # safelinkd: safelink daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (`safelink.toml` plus `SAFELINK_*` overrides)
//! - Install the `tracing` subscriber
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct the stores, the event routes and the in-process bus
//! - Build the axum router around the command handlers
//! - Bind to a TCP port and serve until SIGINT/SIGTERM
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! No domain logic belongs here.

mod config;

use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use safelink_adapter_http_axum::state::AppState;
use safelink_adapter_storage_sqlite_sqlx::{SqliteEmergencyStore, SqliteUserStore};
use safelink_app::event_bus::InProcessEventBus;
use safelink_app::wiring;
use safelink_domain::emergency::NeverAutoResolve;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::Config::load().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.logging.filter).context("invalid logging filter")?,
        )
        .init();

    // Database
    let db = safelink_adapter_storage_sqlite_sqlx::Config {
        database_url: config.database.url.clone(),
    }
    .build()
    .await
    .context("failed to open database")?;

    // Stores
    let emergencies = SqliteEmergencyStore::new(db.pool().clone());
    let users = SqliteUserStore::new(db.pool().clone());

    // Event bus
    let routes = wiring::routes(
        emergencies.clone(),
        users.clone(),
        Arc::new(NeverAutoResolve),
    );
    tracing::debug!(?routes, "event routes");
    let bus = Arc::new(InProcessEventBus::new(routes, config.bus.capacity));

    // HTTP
    let shutdown = CancellationToken::new();
    let state = AppState::new(Arc::clone(&bus), emergencies, users, shutdown.clone());
    let app = safelink_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(%bind_addr, "safelinkd listening");

    tokio::spawn(cancel_on_signal(shutdown.clone()));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .context("server error")?;

    db.close().await;
    tracing::info!("safelinkd stopped");
    Ok(())
}

/// Cancel `shutdown` on the first SIGINT or SIGTERM.
async fn cancel_on_signal(shutdown: CancellationToken) {
    let interrupt = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => {},
        () = terminate => {},
    }
    tracing::info!("shutdown requested");
    shutdown.cancel();
}
