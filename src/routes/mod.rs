use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    middleware::{make_span_with_request_id, request_id_middleware},
    services::CatalogStore,
};

pub mod catalog;
pub mod recommendations;
pub mod search;
pub mod trending;

/// Shared application state
pub struct AppState {
    pub catalog: Arc<CatalogStore>,
}

impl AppState {
    pub fn new(catalog: Arc<CatalogStore>) -> Self {
        Self { catalog }
    }
}

/// Creates the application router with all routes and layers
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/recommendations", post(recommendations::recommend))
        .route("/trending", get(trending::trending))
        .route("/anime/search", get(search::search))
        .route("/catalog/stats", get(catalog::stats))
}

/// API information
async fn root() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": {
            "health": "GET /health",
            "recommendations": "POST /api/v1/recommendations",
            "trending": "GET /api/v1/trending?limit=N",
            "search": "GET /api/v1/anime/search?q=QUERY&limit=N",
            "catalog_stats": "GET /api/v1/catalog/stats"
        }
    }))
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let snapshot = state.catalog.snapshot().await;
    Json(json!({
        "status": "healthy",
        "catalog_size": snapshot.len(),
        "catalog_fetched_at": snapshot.fetched_at(),
        "timestamp": chrono::Utc::now(),
    }))
}
