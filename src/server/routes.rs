//! HTTP routes definition

use axum::{
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};

use super::handlers;

/// Parking lot routes
///
/// REST API:
/// - POST /api/lot            - Re-initialize with slot counts
/// - GET  /api/rates          - Hourly rates
/// - PUT  /api/rates/:class   - Set the rate of one class
/// - POST /api/entries        - Vehicle entry
/// - POST /api/exits          - Vehicle exit
/// - GET  /api/availability   - Free counts, occupied slots, waitlist
/// - GET  /api/stats          - Occupancy and earnings
/// - GET  /api/layout         - Every slot with its state
pub fn lot_routes() -> Router {
    Router::new()
        .route("/api/lot", post(handlers::initialize))
        .route("/api/rates", get(handlers::get_rates))
        .route("/api/rates/:class", put(handlers::set_rate))
        .route("/api/entries", post(handlers::vehicle_entry))
        .route("/api/exits", post(handlers::vehicle_exit))
        .route("/api/availability", get(handlers::availability))
        .route("/api/stats", get(handlers::stats))
        .route("/api/layout", get(handlers::layout))
}

/// Health check routes
pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/_metrics", get(metrics_endpoint))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": crate::VERSION }))
}

/// Prometheus metrics endpoint
async fn metrics_endpoint() -> String {
    crate::metrics::export_metrics()
}
