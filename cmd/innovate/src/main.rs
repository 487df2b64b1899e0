//! # Innovate server
//!
//! Assembles the application: configuration, tracing, the SQLite store,
//! services, the reminder sweeper and the HTTP router.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use api_adapters::AppState;
use auth_adapters::JwtAuth;
use configs::{AppConfig, LogConfig, LogFormat};
use domains::SystemClock;
use services::{spawn_sweeper, FeedSettings, LiveRegistry, Ports, Services};
use storage_adapters::SqliteStore;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    init_tracing(&config.log);

    // 1. Storage
    let store = SqliteStore::connect(&config.database.url, config.database.max_connections)
        .await
        .with_context(|| format!("opening database {}", config.database.url))?;
    store.migrate().await.context("running migrations")?;

    // 2. Services
    let live = Arc::new(LiveRegistry::new());
    let ports = Ports {
        users: Arc::new(store.users()),
        graph: Arc::new(store.graph()),
        posts: Arc::new(store.posts()),
        interactions: Arc::new(store.interactions()),
        messages: Arc::new(store.messages()),
        notifications: Arc::new(store.notifications()),
        communities: Arc::new(store.communities()),
        events: Arc::new(store.events()),
        live: live.clone(),
        clock: Arc::new(SystemClock),
    };
    let feed = FeedSettings {
        default_limit: config.feed.default_limit,
        max_limit: config.feed.max_limit,
        trending_window: chrono::Duration::days(config.feed.trending_window_days),
    };
    let services = Services::new(ports, feed);

    // 3. Background reminder delivery
    let sweeper = spawn_sweeper(
        services.reminders.clone(),
        Duration::from_secs(config.reminders.sweep_interval_secs),
    );

    // 4. HTTP
    let verifier = Arc::new(JwtAuth::new(&config.auth.jwt_secret));
    let app = api_adapters::router(AppState::new(services, verifier, live));

    let address = config.server.address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    info!(%address, "innovate listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    sweeper.abort();
    info!("innovate stopped");
    Ok(())
}

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
