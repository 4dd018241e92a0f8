use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{RecommendationRequest, RecommendationResponse},
    routes::AppState,
    services::{recommendations, validation},
};

/// Handler for recommendations endpoint
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<RecommendationRequest>, JsonRejection>,
) -> AppResult<Json<RecommendationResponse>> {
    let Json(request) = payload.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    let request = validation::validate_recommendation_request(request)?;

    tracing::info!(
        request_id = %request_id,
        titles = request.anime_titles.len(),
        max_recommendations = request.options.max_recommendations,
        "Processing recommendation request"
    );

    let response = recommendations::get_recommendations(&state.catalog, request).await?;

    tracing::info!(
        request_id = %request_id,
        total_found = response.total_found,
        processing_time_ms = response.processing_time_ms,
        "Recommendation request completed"
    );

    Ok(Json(response))
}
