use crate::models::{AnimeRecord, Recommendation};

/// Years back from the current one that still count as recent
pub const TRENDING_WINDOW_YEARS: i32 = 6;
const MIN_TRENDING_SCORE: f64 = 7.5;
const MIN_TRENDING_MEMBERS: u64 = 50_000;
/// Ranks past this contribute nothing to the trending order
const RANK_HORIZON: u32 = 1000;

/// Ordering key blending rating with popularity rank
fn trending_key(record: &AnimeRecord) -> f64 {
    let rank = record.popularity.unwrap_or(RANK_HORIZON).min(RANK_HORIZON);
    record.score * 0.7 + f64::from(RANK_HORIZON - rank) / f64::from(RANK_HORIZON) * 0.3
}

/// How complete and well-attested a record's data is, in [0, 1]
pub fn data_confidence(record: &AnimeRecord) -> f64 {
    let mut confidence: f64 = 0.0;

    if record.score > 0.0 {
        confidence += 0.3;
    }
    if record.scored_by > 1000 {
        confidence += 0.2;
    }
    if record.popularity.is_some_and(|rank| rank <= RANK_HORIZON) {
        confidence += 0.2;
    }
    if record.members > 10_000 {
        confidence += 0.1;
    }
    if !record.genres.is_empty() {
        confidence += 0.1;
    }
    if record.synopsis.as_ref().is_some_and(|s| s.chars().count() > 100) {
        confidence += 0.1;
    }

    confidence.min(1.0)
}

/// Well-rated, widely watched recent releases, best first
pub fn trending(records: &[AnimeRecord], limit: usize, min_year: i32) -> Vec<Recommendation> {
    let mut recent: Vec<&AnimeRecord> = records
        .iter()
        .filter(|r| r.year.is_some_and(|year| year >= min_year))
        .filter(|r| r.score >= MIN_TRENDING_SCORE && r.members > MIN_TRENDING_MEMBERS)
        .collect();

    recent.sort_by(|a, b| {
        trending_key(b)
            .total_cmp(&trending_key(a))
            .then_with(|| a.mal_id.cmp(&b.mal_id))
    });

    recent
        .into_iter()
        .take(limit)
        .map(|record| Recommendation {
            anime: record.clone(),
            similarity_score: (record.score / 10.0).clamp(0.0, 1.0),
            confidence_score: data_confidence(record),
            reasons: vec![format!("Trending anime with {}/10 rating", record.score)],
        })
        .collect()
}
