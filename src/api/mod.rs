//! HTTP surface of the analysis engine.

mod error;
mod handlers;

pub use error::{ApiError, ErrorResponse};

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::engine::SpatialEngine;
use handlers::{
    analyze_handler, bounds_handler, health_handler, not_found_handler,
    parcels_geojson_handler, properties_geojson_handler, stats_handler,
    upload_parcels_handler, upload_properties_handler,
};

/// Application state shared across handlers
pub struct AppState {
    pub engine: SpatialEngine,
    pub server: ServerConfig,
}

impl AppState {
    pub fn new(engine: SpatialEngine, server: ServerConfig) -> Self {
        Self { engine, server }
    }
}

/// Build the application router
pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.server.max_upload_bytes();

    Router::new()
        .route("/", get(health_handler))
        .route("/health", get(health_handler))
        .route("/upload/lotes", post(upload_parcels_handler))
        .route("/upload/imoveis", post(upload_properties_handler))
        .route("/analyze", post(analyze_handler))
        .route("/lotes/geojson", get(parcels_geojson_handler))
        .route("/imoveis/geojson", get(properties_geojson_handler))
        .route("/bounds", get(bounds_handler))
        .route("/stats", get(stats_handler))
        .fallback(not_found_handler)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
