use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use chrono::Datelike;
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{RecommendedAnime, TrendingResponse},
    routes::AppState,
    services::{trending, validation},
};

#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    limit: Option<i64>,
}

/// Handler for trending endpoint
pub async fn trending(
    State(state): State<Arc<AppState>>,
    params: Result<Query<TrendingQuery>, QueryRejection>,
) -> AppResult<Json<TrendingResponse>> {
    let Query(params) = params.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    let limit = validation::validate_limit(params.limit)?;

    let snapshot = state.catalog.ensure_loaded().await;
    let min_year = chrono::Utc::now().year() - trending::TRENDING_WINDOW_YEARS;
    let recommendations = trending::trending(snapshot.records(), limit, min_year);

    Ok(Json(TrendingResponse {
        status: "success".to_string(),
        total_found: recommendations.len(),
        recommendations: recommendations.iter().map(RecommendedAnime::from).collect(),
    }))
}
