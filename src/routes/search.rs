use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    routes::AppState,
    services::{anime_search, validation},
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
    limit: Option<i64>,
}

/// Handler for anime search endpoint
pub async fn search(
    State(state): State<Arc<AppState>>,
    params: Result<Query<SearchQuery>, QueryRejection>,
) -> AppResult<Json<Value>> {
    let Query(params) = params.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    let query = validation::validate_search_query(&params.q)?;
    let limit = validation::validate_limit(params.limit)?;

    let results = anime_search::search_anime(state.catalog.client(), &query, limit).await?;

    Ok(Json(json!({
        "status": "success",
        "query": query,
        "total_found": results.len(),
        "anime": results,
    })))
}
