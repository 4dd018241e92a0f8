use std::collections::HashMap;

use crate::{
    error::{AppError, AppResult},
    models::CatalogStats,
    services::catalog::CatalogSnapshot,
};

const TOP_GENRES: usize = 10;

/// Score buckets as (label, inclusive lower bound, exclusive upper bound)
const SCORE_BUCKETS: [(&str, f64, f64); 5] = [
    ("9.0+", 9.0, f64::INFINITY),
    ("8.0-8.9", 8.0, 9.0),
    ("7.0-7.9", 7.0, 8.0),
    ("6.0-6.9", 6.0, 7.0),
    ("Below 6.0", f64::MIN_POSITIVE, 6.0),
];

/// Summarizes the catalog snapshot
///
/// Returns `CatalogUnavailable` when nothing has been loaded yet.
pub fn catalog_stats(snapshot: &CatalogSnapshot) -> AppResult<CatalogStats> {
    let records = snapshot.records();
    if records.is_empty() {
        return Err(AppError::CatalogUnavailable(
            "Catalog has not been loaded yet".to_string(),
        ));
    }

    let scored: Vec<f64> = records.iter().map(|r| r.score).filter(|s| *s > 0.0).collect();
    let average_score = if scored.is_empty() {
        0.0
    } else {
        let mean = scored.iter().sum::<f64>() / scored.len() as f64;
        (mean * 100.0).round() / 100.0
    };

    let mut genre_counts: HashMap<&str, usize> = HashMap::new();
    for genre in records.iter().flat_map(|r| r.genres.iter()) {
        *genre_counts.entry(genre.as_str()).or_default() += 1;
    }

    let mut top_genres: Vec<(String, usize)> = genre_counts
        .into_iter()
        .map(|(genre, count)| (genre.to_string(), count))
        .collect();
    top_genres.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_genres.truncate(TOP_GENRES);

    let score_distribution = SCORE_BUCKETS
        .iter()
        .map(|(label, low, high)| {
            let count = records
                .iter()
                .filter(|r| r.score >= *low && r.score < *high)
                .count();
            (label.to_string(), count)
        })
        .collect();

    Ok(CatalogStats {
        total_anime: records.len(),
        average_score,
        top_genres,
        score_distribution,
        fetched_at: snapshot.fetched_at(),
    })
}
