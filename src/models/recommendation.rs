use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use super::AnimeRecord;

const SYNOPSIS_PREVIEW_CHARS: usize = 200;

/// Raw recommendation request body, as sent by clients
///
/// Every field is optional here so that the validator, not the JSON
/// extractor, decides what is missing and reports it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendationRequest {
    #[serde(default)]
    pub anime_titles: Option<Vec<String>>,
    #[serde(default)]
    pub max_recommendations: Option<i64>,
    #[serde(default)]
    pub min_score: Option<f64>,
    #[serde(default)]
    pub include_genres: Option<Vec<String>>,
    #[serde(default)]
    pub exclude_genres: Option<Vec<String>>,
}

/// Hard filters and limits applied by the scorer
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationOptions {
    pub max_recommendations: usize,
    pub min_score: f64,
    pub include_genres: BTreeSet<String>,
    pub exclude_genres: BTreeSet<String>,
}

impl Default for RecommendationOptions {
    fn default() -> Self {
        Self {
            max_recommendations: 10,
            min_score: 0.0,
            include_genres: BTreeSet::new(),
            exclude_genres: BTreeSet::new(),
        }
    }
}

/// A request that passed validation; only these reach the scorer
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub anime_titles: Vec<String>,
    pub options: RecommendationOptions,
}

/// Input titles partitioned by whether they resolved to a catalog entry
#[derive(Debug, Clone, Default)]
pub struct SeedSet {
    /// (requested title, resolved record) in request order
    pub found: Vec<(String, AnimeRecord)>,
    pub not_found: Vec<String>,
}

impl SeedSet {
    /// Distinct seed records, first occurrence kept
    ///
    /// Several inputs naming the same show resolve to one record.
    pub fn records(&self) -> Vec<AnimeRecord> {
        let mut seen = HashSet::new();
        self.found
            .iter()
            .filter(|(_, record)| seen.insert(record.mal_id))
            .map(|(_, record)| record.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.found.is_empty()
    }
}

/// A scored candidate with the reasons it was suggested
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub anime: AnimeRecord,
    pub similarity_score: f64,
    pub confidence_score: f64,
    pub reasons: Vec<String>,
}

/// One recommendation as returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendedAnime {
    pub mal_id: u32,
    pub title: String,
    pub title_english: Option<String>,
    pub score: f64,
    pub popularity: Option<u32>,
    pub genres: Vec<String>,
    pub synopsis: Option<String>,
    pub episodes: Option<u32>,
    pub year: Option<i32>,
    pub image_url: Option<String>,
    pub url: Option<String>,
    pub similarity_score: f64,
    pub confidence_score: f64,
    pub reasons: Vec<String>,
}

impl From<&Recommendation> for RecommendedAnime {
    fn from(rec: &Recommendation) -> Self {
        let anime = &rec.anime;
        Self {
            mal_id: anime.mal_id,
            title: anime.title.clone(),
            title_english: anime.title_english.clone(),
            score: anime.score,
            popularity: anime.popularity,
            genres: anime.genres.iter().cloned().collect(),
            synopsis: anime.synopsis.as_deref().map(synopsis_preview),
            episodes: anime.episodes,
            year: anime.year,
            image_url: anime.image_url.clone(),
            url: anime.url.clone(),
            similarity_score: round3(rec.similarity_score),
            confidence_score: round3(rec.confidence_score),
            reasons: rec.reasons.clone(),
        }
    }
}

/// Response for `POST /api/v1/recommendations`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub status: String,
    pub recommendations: Vec<RecommendedAnime>,
    pub total_found: usize,
    pub processing_time_ms: f64,
    pub input_anime_found: Vec<String>,
    pub input_anime_not_found: Vec<String>,
}

/// Response for `GET /api/v1/trending`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingResponse {
    pub status: String,
    pub recommendations: Vec<RecommendedAnime>,
    pub total_found: usize,
}

/// Summary statistics over the current catalog snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogStats {
    pub total_anime: usize,
    pub average_score: f64,
    pub top_genres: Vec<(String, usize)>,
    pub score_distribution: Vec<(String, usize)>,
    pub fetched_at: Option<chrono::DateTime<chrono::Utc>>,
}

fn synopsis_preview(synopsis: &str) -> String {
    if synopsis.chars().count() > SYNOPSIS_PREVIEW_CHARS {
        let preview: String = synopsis.chars().take(SYNOPSIS_PREVIEW_CHARS).collect();
        format!("{}...", preview)
    } else {
        synopsis.to_string()
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
