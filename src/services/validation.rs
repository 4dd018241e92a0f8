use std::collections::BTreeSet;

use crate::{
    error::{AppError, AppResult},
    models::{RecommendationOptions, RecommendationRequest, ValidatedRequest},
};

const MAX_INPUT_TITLES: usize = 10;
const MAX_TITLE_CHARS: usize = 200;
const DEFAULT_MAX_RECOMMENDATIONS: i64 = 10;
const MAX_RECOMMENDATIONS: i64 = 50;
const MAX_GENRES_PER_FILTER: usize = 20;
const MIN_QUERY_CHARS: usize = 2;
const MAX_QUERY_CHARS: usize = 100;
pub const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

/// Characters stripped from every free-text input
const HARMFUL_CHARS: [char; 5] = ['<', '>', '"', '\'', '\\'];

/// Genres, themes and demographics known to MyAnimeList
const KNOWN_GENRES: &[&str] = &[
    "Action", "Adventure", "Avant Garde", "Award Winning", "Boys Love", "Comedy", "Drama",
    "Fantasy", "Girls Love", "Gourmet", "Horror", "Mystery", "Romance", "Sci-Fi",
    "Slice of Life", "Sports", "Supernatural", "Suspense", "Thriller", "Ecchi", "Erotica",
    "Hentai", "Adult Cast", "Anthropomorphic", "CGDCT", "Childcare", "Combat Sports",
    "Crossdressing", "Delinquents", "Detective", "Educational", "Gag Humor", "Gore", "Harem",
    "High Stakes Game", "Historical", "Idols (Female)", "Idols (Male)", "Isekai", "Iyashikei",
    "Love Polygon", "Magical Sex Shift", "Mahou Shoujo", "Martial Arts", "Mecha", "Medical",
    "Military", "Music", "Mythology", "Organized Crime", "Otaku Culture", "Parody",
    "Performing Arts", "Pets", "Psychological", "Racing", "Reincarnation", "Reverse Harem",
    "Romantic Subtext", "Samurai", "School", "Showbiz", "Space", "Strategy Game", "Super Power",
    "Survival", "Team Sports", "Time Travel", "Vampire", "Video Game", "Visual Arts", "Workplace",
    "Josei", "Kids", "Seinen", "Shoujo", "Shounen",
];

/// Validates a raw recommendation request
///
/// Only the returned value is allowed to reach the scorer. Titles are
/// sanitized and deduplicated case-insensitively, genres are canonicalized to
/// their MyAnimeList spelling.
pub fn validate_recommendation_request(
    request: RecommendationRequest,
) -> AppResult<ValidatedRequest> {
    let anime_titles = validate_anime_titles(request.anime_titles)?;
    let max_recommendations = validate_max_recommendations(request.max_recommendations)?;
    let min_score = validate_min_score(request.min_score)?;
    let include_genres = validate_genres(request.include_genres, "include_genres")?;
    let exclude_genres = validate_genres(request.exclude_genres, "exclude_genres")?;

    if let Some(genre) = include_genres.intersection(&exclude_genres).next() {
        return Err(AppError::InvalidInput(format!(
            "Genre '{}' cannot be both included and excluded",
            genre
        )));
    }

    Ok(ValidatedRequest {
        anime_titles,
        options: RecommendationOptions {
            max_recommendations,
            min_score,
            include_genres,
            exclude_genres,
        },
    })
}

fn validate_anime_titles(titles: Option<Vec<String>>) -> AppResult<Vec<String>> {
    let titles = titles
        .ok_or_else(|| AppError::InvalidInput("anime_titles is required".to_string()))?;

    if titles.is_empty() {
        return Err(AppError::InvalidInput(
            "anime_titles cannot be empty".to_string(),
        ));
    }

    if titles.len() > MAX_INPUT_TITLES {
        return Err(AppError::InvalidInput(format!(
            "Maximum {} anime titles allowed",
            MAX_INPUT_TITLES
        )));
    }

    let mut seen = BTreeSet::new();
    let mut unique = Vec::with_capacity(titles.len());

    for (i, title) in titles.iter().enumerate() {
        let sanitized = sanitize_text(title);

        if sanitized.is_empty() {
            return Err(AppError::InvalidInput(format!(
                "Title at index {} is empty or invalid",
                i
            )));
        }

        if sanitized.chars().count() > MAX_TITLE_CHARS {
            return Err(AppError::InvalidInput(format!(
                "Title at index {} is too long (max {} characters)",
                i, MAX_TITLE_CHARS
            )));
        }

        if seen.insert(sanitized.to_lowercase()) {
            unique.push(sanitized);
        }
    }

    Ok(unique)
}

fn validate_max_recommendations(max: Option<i64>) -> AppResult<usize> {
    let max = max.unwrap_or(DEFAULT_MAX_RECOMMENDATIONS);

    if max < 1 {
        return Err(AppError::InvalidInput(
            "max_recommendations must be at least 1".to_string(),
        ));
    }

    if max > MAX_RECOMMENDATIONS {
        return Err(AppError::InvalidInput(format!(
            "max_recommendations cannot exceed {}",
            MAX_RECOMMENDATIONS
        )));
    }

    Ok(max as usize)
}

fn validate_min_score(min_score: Option<f64>) -> AppResult<f64> {
    let min_score = min_score.unwrap_or(0.0);

    if !min_score.is_finite() {
        return Err(AppError::InvalidInput(
            "min_score must be a number".to_string(),
        ));
    }

    if min_score < 0.0 {
        return Err(AppError::InvalidInput(
            "min_score cannot be negative".to_string(),
        ));
    }

    if min_score > 10.0 {
        return Err(AppError::InvalidInput(
            "min_score cannot exceed 10.0".to_string(),
        ));
    }

    Ok(min_score)
}

fn validate_genres(genres: Option<Vec<String>>, field: &str) -> AppResult<BTreeSet<String>> {
    let genres = genres.unwrap_or_default();

    if genres.len() > MAX_GENRES_PER_FILTER {
        return Err(AppError::InvalidInput(format!(
            "{} cannot have more than {} genres",
            field, MAX_GENRES_PER_FILTER
        )));
    }

    let mut validated = BTreeSet::new();
    for (i, genre) in genres.iter().enumerate() {
        let sanitized = title_case(&sanitize_text(genre));

        if sanitized.is_empty() {
            return Err(AppError::InvalidInput(format!(
                "Genre at index {} in {} is empty or invalid",
                i, field
            )));
        }

        validated.insert(canonical_genre(&sanitized));
    }

    Ok(validated)
}

/// Validates the `q` parameter of the search endpoint
pub fn validate_search_query(query: &str) -> AppResult<String> {
    let trimmed = query.trim();

    if trimmed.is_empty() {
        return Err(AppError::InvalidInput("Query cannot be empty".to_string()));
    }

    let length = trimmed.chars().count();
    if length < MIN_QUERY_CHARS {
        return Err(AppError::InvalidInput(format!(
            "Query must be at least {} characters long",
            MIN_QUERY_CHARS
        )));
    }

    if length > MAX_QUERY_CHARS {
        return Err(AppError::InvalidInput(format!(
            "Query cannot exceed {} characters",
            MAX_QUERY_CHARS
        )));
    }

    let sanitized: String = trimmed.chars().filter(|c| *c != ';').collect();
    let sanitized = sanitize_text(&sanitized);

    if sanitized.is_empty() {
        return Err(AppError::InvalidInput(
            "Query contains only invalid characters".to_string(),
        ));
    }

    Ok(sanitized)
}

/// Validates a `limit` query parameter, defaulting when absent
pub fn validate_limit(limit: Option<i64>) -> AppResult<usize> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT);

    if limit < 1 {
        return Err(AppError::InvalidInput("limit must be at least 1".to_string()));
    }

    if limit > MAX_LIMIT {
        return Err(AppError::InvalidInput(format!(
            "limit cannot exceed {}",
            MAX_LIMIT
        )));
    }

    Ok(limit as usize)
}

/// Trims, strips harmful characters and collapses inner whitespace
fn sanitize_text(input: &str) -> String {
    input
        .chars()
        .filter(|c| !HARMFUL_CHARS.contains(c))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(input: &str) -> String {
    input
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn canonical_genre(genre: &str) -> String {
    match KNOWN_GENRES.iter().find(|known| known.eq_ignore_ascii_case(genre)) {
        Some(known) => known.to_string(),
        None => {
            tracing::debug!(genre = %genre, "Unknown genre in filter");
            genre.to_string()
        }
    }
}
