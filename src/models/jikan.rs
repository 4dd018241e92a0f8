//! Wire types for the Jikan v4 API
//!
//! Only the fields the catalog uses are modelled. Jikan omits or nulls many
//! fields for obscure entries, so nearly everything is defaulted.

use serde::{Deserialize, Serialize};

use super::AnimeRecord;

/// Response body of list endpoints (`/top/anime`, `/anime?q=`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JikanListResponse {
    #[serde(default)]
    pub data: Vec<JikanAnime>,
    #[serde(default)]
    pub pagination: Option<JikanPagination>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JikanPagination {
    #[serde(default)]
    pub last_visible_page: u32,
    #[serde(default)]
    pub has_next_page: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JikanAnime {
    pub mal_id: u32,
    pub title: String,
    #[serde(default)]
    pub title_english: Option<String>,
    #[serde(default)]
    pub title_japanese: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub images: Option<JikanImages>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub scored_by: Option<u64>,
    #[serde(default)]
    pub popularity: Option<u32>,
    #[serde(default)]
    pub members: Option<u64>,
    #[serde(default)]
    pub favorites: Option<u64>,
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub episodes: Option<u32>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub aired: Option<JikanAired>,
    #[serde(default)]
    pub genres: Vec<JikanEntity>,
    #[serde(default)]
    pub themes: Vec<JikanEntity>,
    #[serde(default)]
    pub demographics: Vec<JikanEntity>,
    #[serde(default)]
    pub studios: Vec<JikanEntity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JikanEntity {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JikanImages {
    #[serde(default)]
    pub jpg: Option<JikanImageSet>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JikanImageSet {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub large_image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JikanAired {
    #[serde(default)]
    pub prop: Option<JikanAiredProp>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JikanAiredProp {
    #[serde(default)]
    pub from: Option<JikanDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JikanDate {
    #[serde(default)]
    pub year: Option<i32>,
}

impl JikanAnime {
    /// Season year when present, otherwise the year the show started airing
    fn release_year(&self) -> Option<i32> {
        self.year.or_else(|| {
            self.aired
                .as_ref()
                .and_then(|a| a.prop.as_ref())
                .and_then(|p| p.from.as_ref())
                .and_then(|d| d.year)
        })
    }
}

impl From<JikanAnime> for AnimeRecord {
    fn from(anime: JikanAnime) -> Self {
        let year = anime.release_year();

        let genres = anime
            .genres
            .iter()
            .chain(anime.themes.iter())
            .chain(anime.demographics.iter())
            .map(|entity| entity.name.clone())
            .collect();

        let image_url = anime
            .images
            .and_then(|images| images.jpg)
            .and_then(|jpg| jpg.large_image_url.or(jpg.image_url));

        AnimeRecord {
            mal_id: anime.mal_id,
            title: anime.title,
            title_english: anime.title_english,
            title_japanese: anime.title_japanese,
            score: anime.score.unwrap_or(0.0),
            scored_by: anime.scored_by.unwrap_or(0),
            popularity: anime.popularity.filter(|rank| *rank > 0),
            members: anime.members.unwrap_or(0),
            favorites: anime.favorites.unwrap_or(0),
            genres,
            studios: anime.studios.into_iter().map(|s| s.name).collect(),
            episodes: anime.episodes,
            year,
            synopsis: anime.synopsis.filter(|s| !s.trim().is_empty()),
            image_url,
            url: anime.url,
        }
    }
}
