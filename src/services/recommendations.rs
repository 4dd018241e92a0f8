use std::time::Instant;

use crate::{
    error::{AppError, AppResult},
    models::{RecommendationResponse, RecommendedAnime, ValidatedRequest},
    services::{catalog::CatalogStore, scorer, seeds},
};

/// Generates recommendations for a validated request
///
/// Loads the catalog if needed, resolves the seed titles against it
/// (falling back to upstream search) and ranks the snapshot against the
/// resolved seeds. Fails only when none of the seeds resolve.
pub async fn get_recommendations(
    store: &CatalogStore,
    request: ValidatedRequest,
) -> AppResult<RecommendationResponse> {
    let start = Instant::now();

    let snapshot = store.ensure_loaded().await;
    let seed_set =
        seeds::resolve_seeds(&request.anime_titles, snapshot.records(), store.client()).await;

    if seed_set.is_empty() {
        return Err(AppError::NoSeedsFound(seed_set.not_found));
    }

    let recommendations =
        scorer::recommend(&seed_set.records(), snapshot.records(), &request.options)?;

    let processing_time_ms = start.elapsed().as_secs_f64() * 1000.0;

    tracing::info!(
        seeds_found = seed_set.found.len(),
        seeds_missing = seed_set.not_found.len(),
        pool = snapshot.len(),
        returned = recommendations.len(),
        processing_time_ms,
        "Recommendations generated"
    );

    Ok(RecommendationResponse {
        status: "success".to_string(),
        total_found: recommendations.len(),
        recommendations: recommendations.iter().map(RecommendedAnime::from).collect(),
        processing_time_ms: (processing_time_ms * 100.0).round() / 100.0,
        input_anime_found: seed_set.found.into_iter().map(|(title, _)| title).collect(),
        input_anime_not_found: seed_set.not_found,
    })
}
