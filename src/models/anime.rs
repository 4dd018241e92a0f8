use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A single anime entry from the catalog
///
/// Records are immutable once fetched; the catalog snapshot owns them and
/// request handlers only ever borrow them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnimeRecord {
    pub mal_id: u32,
    /// Primary (romanized) title, the key used for matching
    pub title: String,
    #[serde(default)]
    pub title_english: Option<String>,
    #[serde(default)]
    pub title_japanese: Option<String>,
    /// Community score on a 0–10 scale, 0.0 when unscored
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub scored_by: u64,
    /// Popularity rank; lower is more popular
    #[serde(default)]
    pub popularity: Option<u32>,
    #[serde(default)]
    pub members: u64,
    #[serde(default)]
    pub favorites: u64,
    /// Genres, themes and demographics
    #[serde(default)]
    pub genres: BTreeSet<String>,
    #[serde(default)]
    pub studios: Vec<String>,
    #[serde(default)]
    pub episodes: Option<u32>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl AnimeRecord {
    /// Creates a minimal record; remaining fields take their empty defaults
    pub fn new(mal_id: u32, title: impl Into<String>) -> Self {
        Self {
            mal_id,
            title: title.into(),
            title_english: None,
            title_japanese: None,
            score: 0.0,
            scored_by: 0,
            popularity: None,
            members: 0,
            favorites: 0,
            genres: BTreeSet::new(),
            studios: Vec::new(),
            episodes: None,
            year: None,
            synopsis: None,
            image_url: None,
            url: None,
        }
    }

    /// All known titles for this entry, primary first
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.title.as_str())
            .chain(self.title_english.as_deref())
            .chain(self.title_japanese.as_deref())
    }

    /// Case-insensitive comparison against any known title
    pub fn has_title(&self, candidate: &str) -> bool {
        let candidate = candidate.trim().to_lowercase();
        self.titles().any(|t| t.to_lowercase() == candidate)
    }

    /// Title shown to users, with the English title appended when it differs
    pub fn display_title(&self) -> String {
        match &self.title_english {
            Some(english) if english != &self.title => format!("{} ({})", self.title, english),
            _ => self.title.clone(),
        }
    }

    /// Whether the entry carries enough data to be scored
    pub fn is_scorable(&self) -> bool {
        self.score > 0.0 && !self.genres.is_empty()
    }

    /// Case-insensitive genre membership
    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g.eq_ignore_ascii_case(genre))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frieren() -> AnimeRecord {
        let mut record = AnimeRecord::new(52991, "Sousou no Frieren");
        record.title_english = Some("Frieren: Beyond Journey's End".to_string());
        record.title_japanese = Some("葬送のフリーレン".to_string());
        record.score = 9.3;
        record.genres = ["Adventure", "Drama", "Fantasy", "Shounen"]
            .into_iter()
            .map(String::from)
            .collect();
        record
    }

    #[test]
    fn test_has_title_matches_any_title_case_insensitively() {
        let record = frieren();
        assert!(record.has_title("sousou no frieren"));
        assert!(record.has_title("  FRIEREN: BEYOND JOURNEY'S END "));
        assert!(record.has_title("葬送のフリーレン"));
        assert!(!record.has_title("Frieren"));
    }

    #[test]
    fn test_display_title() {
        let mut record = frieren();
        assert_eq!(
            record.display_title(),
            "Sousou no Frieren (Frieren: Beyond Journey's End)"
        );

        record.title_english = Some("Sousou no Frieren".to_string());
        assert_eq!(record.display_title(), "Sousou no Frieren");
    }

    #[test]
    fn test_is_scorable() {
        let mut record = frieren();
        assert!(record.is_scorable());

        record.score = 0.0;
        assert!(!record.is_scorable());
    }

    #[test]
    fn test_has_genre_ignores_case() {
        let record = frieren();
        assert!(record.has_genre("fantasy"));
        assert!(!record.has_genre("Horror"));
    }

    #[test]
    fn test_deserialize_with_missing_optional_fields() {
        let json = r#"{ "mal_id": 1, "title": "Cowboy Bebop" }"#;
        let record: AnimeRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record, AnimeRecord::new(1, "Cowboy Bebop"));
    }
}
