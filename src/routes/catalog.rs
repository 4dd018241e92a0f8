use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{error::AppResult, models::CatalogStats, routes::AppState, services::stats};

/// Handler for catalog statistics endpoint
pub async fn stats(State(state): State<Arc<AppState>>) -> AppResult<Json<CatalogStats>> {
    let snapshot = state.catalog.snapshot().await;
    Ok(Json(stats::catalog_stats(&snapshot)?))
}
