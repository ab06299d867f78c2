//! HTTP service for tocmend.
//!
//! One endpoint does the work: `POST /update-toc` takes a multipart upload,
//! runs the repair pipeline against a per-request engine session, and
//! returns the transformed document as an attachment. A background sweep
//! keeps the downloads directory from accumulating request artifacts, and
//! the engine's startup reset runs before the listener binds.

mod handlers;
mod sweeper;
mod types;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tocmend_core::{Config, Engine};

pub use sweeper::sweep_once;
pub use types::*;

/// Server state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Engine supervisor handing out one exclusive session per request.
    pub engine: Arc<Engine>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(engine: Engine, config: Config) -> Self {
        Self {
            engine: Arc::new(engine),
            config: Arc::new(config),
        }
    }
}

/// Build the router with all endpoints
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/update-toc", post(handlers::update_toc))
        .with_state(state)
}

/// Start the service: startup reset, retention sweep, then serve.
pub async fn start_server(config: Config) -> Result<()> {
    fs::create_dir_all(&config.server.downloads_dir).with_context(|| {
        format!(
            "failed to create downloads dir {}",
            config.server.downloads_dir.display()
        )
    })?;

    // Supervisor precondition: reset lingering engine state before any
    // request is accepted.
    let engine = Engine::startup(&config.server.scratch_dir)?;

    sweeper::spawn(
        config.server.downloads_dir.clone(),
        Duration::from_secs(config.retention.max_age_secs),
        Duration::from_secs(config.retention.sweep_interval_secs),
    );

    let addr = config.server.addr.clone();
    let state = AppState::new(engine, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    log::info!("tocmend listening on {addr}");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

/// Blocking entry point for callers without their own runtime.
pub fn run_blocking(config: Config) -> Result<()> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?
        .block_on(start_server(config))
}
