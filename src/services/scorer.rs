//! Content-based scoring of catalog candidates against a set of seed anime
//!
//! Every candidate gets four sub-scores in [0, 1] (genre overlap, rating
//! compatibility, popularity, release-year proximity) which are blended with
//! fixed weights into the similarity score. The routine is pure: identical
//! seeds, pool and options always produce the same ordered output.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::{
    error::{AppError, AppResult},
    models::{AnimeRecord, Recommendation, RecommendationOptions},
};

pub const GENRE_WEIGHT: f64 = 0.40;
pub const RATING_WEIGHT: f64 = 0.30;
pub const POPULARITY_WEIGHT: f64 = 0.20;
pub const YEAR_WEIGHT: f64 = 0.10;

/// Used when no seed carries a score
const NEUTRAL_RATING: f64 = 0.5;
/// Used when the candidate has no popularity rank
const NEUTRAL_POPULARITY: f64 = 0.3;
/// Used when the candidate or every seed lacks a year
const NEUTRAL_YEAR: f64 = 0.5;

const GENRE_REASON_THRESHOLD: f64 = 0.3;
const RATING_REASON_THRESHOLD: f64 = 0.85;
const POPULARITY_REASON_THRESHOLD: f64 = 0.8;
const YEAR_REASON_THRESHOLD: f64 = 0.8;
const MAX_REASON_GENRES: usize = 3;

/// Per-candidate sub-scores, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubScores {
    pub genre: f64,
    pub rating: f64,
    pub popularity: f64,
    pub year: f64,
}

impl SubScores {
    /// Weighted blend of the sub-scores
    pub fn similarity(&self) -> f64 {
        let blended = self.genre * GENRE_WEIGHT
            + self.rating * RATING_WEIGHT
            + self.popularity * POPULARITY_WEIGHT
            + self.year * YEAR_WEIGHT;
        blended.clamp(0.0, 1.0)
    }

    /// Agreement between the sub-scores: 1 when they are all equal,
    /// falling linearly with their standard deviation (at most 0.5 on [0, 1]).
    pub fn confidence(&self) -> f64 {
        let values = [self.genre, self.rating, self.popularity, self.year];
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let variance =
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        (1.0 - 2.0 * variance.sqrt()).clamp(0.0, 1.0)
    }
}

/// Aggregate view of the seeds every candidate is compared against
struct SeedProfile {
    genres: BTreeSet<String>,
    mean_score: Option<f64>,
    mean_year: Option<f64>,
}

impl SeedProfile {
    fn new(seeds: &[AnimeRecord]) -> Self {
        let genres = seeds.iter().flat_map(|s| s.genres.iter().cloned()).collect();

        let scores: Vec<f64> = seeds.iter().map(|s| s.score).filter(|s| *s > 0.0).collect();
        let years: Vec<f64> = seeds.iter().filter_map(|s| s.year).map(f64::from).collect();

        Self {
            genres,
            mean_score: mean(&scores),
            mean_year: mean(&years),
        }
    }
}

/// Min-max bounds over the whole pool, used for normalization
struct PoolBounds {
    rank_range: Option<(u32, u32)>,
    year_span: f64,
}

impl PoolBounds {
    fn new(seeds: &[AnimeRecord], pool: &[AnimeRecord]) -> Self {
        let ranks = pool.iter().filter_map(|r| r.popularity);
        let rank_range = ranks.fold(None, |acc: Option<(u32, u32)>, rank| match acc {
            Some((lo, hi)) => Some((lo.min(rank), hi.max(rank))),
            None => Some((rank, rank)),
        });

        let years: Vec<i32> = pool.iter().chain(seeds).filter_map(|r| r.year).collect();
        let year_span = match (years.iter().min(), years.iter().max()) {
            (Some(lo), Some(hi)) => f64::from(hi - lo),
            _ => 0.0,
        };

        Self {
            rank_range,
            year_span,
        }
    }
}

/// Ranks `pool` against `seeds`, applying the hard filters in `opts`
///
/// Candidates that are themselves seeds are never returned. An empty result
/// is not an error; having no seeds at all is.
pub fn recommend(
    seeds: &[AnimeRecord],
    pool: &[AnimeRecord],
    opts: &RecommendationOptions,
) -> AppResult<Vec<Recommendation>> {
    if seeds.is_empty() {
        return Err(AppError::NoSeedsFound(Vec::new()));
    }

    let profile = SeedProfile::new(seeds);
    let bounds = PoolBounds::new(seeds, pool);

    let mut recommendations: Vec<Recommendation> = pool
        .iter()
        .filter(|candidate| !is_seed(candidate, seeds))
        .filter(|candidate| passes_filters(candidate, opts))
        .map(|candidate| {
            let scores = sub_scores(&profile, &bounds, candidate);
            Recommendation {
                anime: candidate.clone(),
                similarity_score: scores.similarity(),
                confidence_score: scores.confidence(),
                reasons: reasons(&profile, candidate, &scores),
            }
        })
        .collect();

    let scored = recommendations.len();
    recommendations.sort_by(compare_recommendations);
    recommendations.truncate(opts.max_recommendations);

    tracing::debug!(
        seeds = seeds.len(),
        pool = pool.len(),
        scored,
        returned = recommendations.len(),
        "Scored candidate pool"
    );

    Ok(recommendations)
}

/// Jaccard index |A ∩ B| / |A ∪ B|; 0 when both sets are empty
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

fn is_seed(candidate: &AnimeRecord, seeds: &[AnimeRecord]) -> bool {
    seeds.iter().any(|seed| {
        seed.mal_id == candidate.mal_id || candidate.titles().any(|t| seed.has_title(t))
    })
}

fn passes_filters(candidate: &AnimeRecord, opts: &RecommendationOptions) -> bool {
    if candidate.score < opts.min_score {
        return false;
    }

    if opts.exclude_genres.iter().any(|g| candidate.has_genre(g)) {
        return false;
    }

    opts.include_genres.is_empty() || opts.include_genres.iter().any(|g| candidate.has_genre(g))
}

fn sub_scores(profile: &SeedProfile, bounds: &PoolBounds, candidate: &AnimeRecord) -> SubScores {
    let genre = jaccard(&candidate.genres, &profile.genres);

    let rating = match profile.mean_score {
        Some(mean) => 1.0 - (candidate.score - mean).abs() / 10.0,
        None => NEUTRAL_RATING,
    };

    let popularity = match (candidate.popularity, bounds.rank_range) {
        (Some(rank), Some((lo, hi))) if hi > lo => {
            f64::from(hi - rank.min(hi)) / f64::from(hi - lo)
        }
        (Some(_), Some(_)) => 1.0,
        _ => NEUTRAL_POPULARITY,
    };

    let year = match (candidate.year, profile.mean_year) {
        (Some(year), Some(mean)) => {
            1.0 - (f64::from(year) - mean).abs() / bounds.year_span.max(1.0)
        }
        _ => NEUTRAL_YEAR,
    };

    SubScores {
        genre: genre.clamp(0.0, 1.0),
        rating: rating.clamp(0.0, 1.0),
        popularity: popularity.clamp(0.0, 1.0),
        year: year.clamp(0.0, 1.0),
    }
}

fn reasons(profile: &SeedProfile, candidate: &AnimeRecord, scores: &SubScores) -> Vec<String> {
    let mut reasons = Vec::new();

    if scores.genre > GENRE_REASON_THRESHOLD {
        let shared: Vec<&str> = candidate
            .genres
            .intersection(&profile.genres)
            .take(MAX_REASON_GENRES)
            .map(String::as_str)
            .collect();
        reasons.push(format!("Similar genres: {}", shared.join(", ")));
    }

    if scores.rating > RATING_REASON_THRESHOLD {
        if let Some(mean) = profile.mean_score {
            reasons.push(format!(
                "Rated {:.2}/10, close to the {:.2} average of your picks",
                candidate.score, mean
            ));
        }
    }

    if scores.popularity > POPULARITY_REASON_THRESHOLD {
        if let Some(rank) = candidate.popularity {
            reasons.push(format!("Very popular (rank #{})", rank));
        }
    }

    if scores.year > YEAR_REASON_THRESHOLD {
        if let (Some(year), Some(mean)) = (candidate.year, profile.mean_year) {
            let gap = (f64::from(year) - mean).abs().round() as i64;
            if gap == 0 {
                reasons.push(format!("Released in {}, the same era as your picks", year));
            } else {
                reasons.push(format!(
                    "Released in {}, within {} year{} of your picks",
                    year,
                    gap,
                    if gap == 1 { "" } else { "s" }
                ));
            }
        }
    }

    if reasons.is_empty() {
        reasons.push("Recommended based on overall similarity".to_string());
    }

    reasons
}

/// Similarity descending, then score descending, then title ascending
fn compare_recommendations(a: &Recommendation, b: &Recommendation) -> Ordering {
    b.similarity_score
        .total_cmp(&a.similarity_score)
        .then_with(|| b.anime.score.total_cmp(&a.anime.score))
        .then_with(|| a.anime.title.cmp(&b.anime.title))
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
