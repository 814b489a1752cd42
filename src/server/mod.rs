//! Parklot HTTP service
//!
//! Exposes the allocation engine as a JSON API using axum. The whole engine
//! is one consistency domain: every handler takes the single engine lock
//! once, runs its operation to completion and releases it without awaiting.

pub mod handlers;
pub mod routes;

use axum::{extract::Extension, Router};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::allocation::AllocationEngine;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP server bind address
    pub http_addr: String,
    /// HTTP port
    pub http_port: u16,
    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: "127.0.0.1".to_string(),
            http_port: 8080,
            enable_cors: false,
        }
    }
}

/// Engine handle shared by all requests
pub type SharedEngine = Arc<Mutex<AllocationEngine>>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: SharedEngine,
    pub config: ServerConfig,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish()
    }
}

impl AppState {
    pub fn new(engine: AllocationEngine, config: ServerConfig) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            config,
        }
    }
}

/// Build the router with all routes and layers
pub fn build_router(state: AppState) -> Router {
    let enable_cors = state.config.enable_cors;

    let app = Router::new()
        .merge(routes::lot_routes())
        .merge(routes::health_routes())
        .layer(Extension(Arc::new(state)))
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Start the HTTP server and run until Ctrl-C
pub async fn start_server(config: ServerConfig, engine: AllocationEngine) -> anyhow::Result<()> {
    crate::metrics::init_metrics();
    crate::metrics::update_gauges(&engine);

    let addr = format!("{}:{}", config.http_addr, config.http_port);
    let app = build_router(AppState::new(engine, config));

    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    info!("Metrics: http://{}/_metrics", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!(error = %e, "Server error");
            anyhow::anyhow!("Server failed: {}", e)
        })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}
