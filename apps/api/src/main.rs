mod config;
mod errors;
mod interview;
mod jobs;
mod models;
mod routes;
mod session;
mod state;
mod tailoring;
mod upstream;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::routes::build_router;
use crate::session::store::SessionStore;
use crate::state::AppState;
use crate::upstream::HttpUpstream;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting WorkMate API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the upstream backend client
    let upstream = HttpUpstream::new(&config.upstream_url, config.upstream_timeout)?;
    info!(
        "Upstream client initialized ({}, timeout {:?})",
        config.upstream_url, config.upstream_timeout
    );

    // Session registry with idle expiry
    let sessions = SessionStore::new();
    sessions.spawn_sweeper(config.session_idle_timeout);
    info!(
        "Session sweeper running (idle timeout {:?})",
        config.session_idle_timeout
    );

    let state = AppState {
        upstream: Arc::new(upstream),
        sessions,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
