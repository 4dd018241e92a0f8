use strsim::jaro_winkler;

use crate::{
    models::{AnimeRecord, SeedSet},
    services::catalog::CatalogClient,
};

/// Minimum similarity for a fuzzy title match
const FUZZY_THRESHOLD: f64 = 0.92;
/// Shorter inputs only match exactly; "a" is contained in almost every title
const MIN_CONTAINMENT_LEN: usize = 3;
/// Upstream hits considered when a title is missing from the catalog
const SEED_SEARCH_LIMIT: usize = 5;

fn normalize(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Best jaro-winkler similarity between `query` and any title of `record`
fn title_similarity(query: &str, record: &AnimeRecord) -> f64 {
    record
        .titles()
        .map(|t| jaro_winkler(query, &normalize(t)))
        .fold(0.0, f64::max)
}

fn contains_either_way(query: &str, record: &AnimeRecord) -> bool {
    record.titles().any(|t| {
        let t = normalize(t);
        t.len() >= MIN_CONTAINMENT_LEN && (t.contains(query) || query.contains(&t))
    })
}

/// Picks the highest scoring record, keeping the earliest one on ties
fn best_by<'a>(
    records: impl Iterator<Item = &'a AnimeRecord>,
    score: impl Fn(&AnimeRecord) -> f64,
) -> Option<(&'a AnimeRecord, f64)> {
    records.fold(None, |best, record| {
        let s = score(record);
        match best {
            Some((_, best_score)) if best_score >= s => best,
            _ => Some((record, s)),
        }
    })
}

/// Resolves a title against the catalog snapshot
///
/// Tries, in order: case-insensitive exact match on any title, then
/// containment in either direction, then fuzzy similarity.
pub fn find_in_catalog<'a>(title: &str, records: &'a [AnimeRecord]) -> Option<&'a AnimeRecord> {
    let query = normalize(title);
    if query.is_empty() {
        return None;
    }

    if let Some(exact) = records.iter().find(|r| r.has_title(&query)) {
        return Some(exact);
    }

    if query.len() >= MIN_CONTAINMENT_LEN {
        let containing = records.iter().filter(|r| contains_either_way(&query, r));
        if let Some((record, _)) = best_by(containing, |r| title_similarity(&query, r)) {
            return Some(record);
        }
    }

    best_by(records.iter(), |r| title_similarity(&query, r))
        .filter(|(_, score)| *score >= FUZZY_THRESHOLD)
        .map(|(record, _)| record)
}

/// Picks the seed from upstream search hits: an exact title match if any,
/// otherwise the first (most popular) hit
pub fn best_search_hit(title: &str, hits: Vec<AnimeRecord>) -> Option<AnimeRecord> {
    let exact = hits.iter().position(|r| r.has_title(title));
    let mut hits = hits;
    match exact {
        Some(index) => Some(hits.swap_remove(index)),
        None => hits.into_iter().next(),
    }
}

/// Resolves every requested title into a `SeedSet`
///
/// Titles missing from the snapshot are looked up with the client's search.
/// Search failures are logged and the title reported as not found; the
/// snapshot itself is never modified.
pub async fn resolve_seeds(
    titles: &[String],
    records: &[AnimeRecord],
    client: &dyn CatalogClient,
) -> SeedSet {
    let mut seeds = SeedSet::default();

    for title in titles {
        if let Some(record) = find_in_catalog(title, records) {
            tracing::debug!(input = %title, matched = %record.display_title(), "Seed resolved from catalog");
            seeds.found.push((title.clone(), record.clone()));
            continue;
        }

        match client.search(title, SEED_SEARCH_LIMIT).await {
            Ok(hits) => match best_search_hit(title, hits) {
                Some(record) => {
                    tracing::debug!(input = %title, matched = %record.display_title(), "Seed resolved by search");
                    seeds.found.push((title.clone(), record));
                }
                None => seeds.not_found.push(title.clone()),
            },
            Err(e) => {
                tracing::warn!(input = %title, error = %e, "Seed search failed");
                seeds.not_found.push(title.clone());
            }
        }
    }

    seeds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::services::catalog::MockCatalogClient;

    fn record(mal_id: u32, title: &str, english: Option<&str>) -> AnimeRecord {
        let mut record = AnimeRecord::new(mal_id, title);
        record.title_english = english.map(String::from);
        record.score = 8.0;
        record
    }

    fn catalog() -> Vec<AnimeRecord> {
        vec![
            record(5114, "Fullmetal Alchemist: Brotherhood", None),
            record(16498, "Shingeki no Kyojin", Some("Attack on Titan")),
            record(1, "Cowboy Bebop", None),
            record(5, "Cowboy Bebop: Tengoku no Tobira", Some("Cowboy Bebop: The Movie")),
        ]
    }

    #[test]
    fn test_exact_match_on_english_title() {
        let records = catalog();
        let found = find_in_catalog("attack on titan", &records).unwrap();
        assert_eq!(found.mal_id, 16498);
    }

    #[test]
    fn test_exact_match_beats_containment() {
        let records = catalog();
        // "Cowboy Bebop" is also contained in the movie's titles
        let found = find_in_catalog("COWBOY BEBOP", &records).unwrap();
        assert_eq!(found.mal_id, 1);
    }

    #[test]
    fn test_containment_match() {
        let records = catalog();
        let found = find_in_catalog("Fullmetal Alchemist", &records).unwrap();
        assert_eq!(found.mal_id, 5114);
    }

    #[test]
    fn test_fuzzy_match_tolerates_typos() {
        let records = catalog();
        let found = find_in_catalog("Shingeki no Kyojim", &records).unwrap();
        assert_eq!(found.mal_id, 16498);
    }

    #[test]
    fn test_unrelated_title_not_found() {
        let records = catalog();
        assert!(find_in_catalog("Mushishi", &records).is_none());
        assert!(find_in_catalog("  ", &records).is_none());
    }

    #[test]
    fn test_best_search_hit_prefers_exact_title() {
        let hits = vec![record(1, "Naruto: Shippuuden", None), record(20, "Naruto", None)];
        assert_eq!(best_search_hit("naruto", hits).unwrap().mal_id, 20);

        let hits = vec![record(1, "Naruto: Shippuuden", None), record(20, "Naruto", None)];
        assert_eq!(best_search_hit("naruto shippuden", hits).unwrap().mal_id, 1);

        assert!(best_search_hit("naruto", vec![]).is_none());
    }

    #[tokio::test]
    async fn test_resolve_seeds_uses_search_fallback() {
        let mut client = MockCatalogClient::new();
        client
            .expect_search()
            .withf(|q, limit| q.eq_ignore_ascii_case("Mushishi") && *limit == 5)
            .times(1)
            .returning(|_, _| Ok(vec![record(457, "Mushishi", None)]));
        client
            .expect_search()
            .withf(|q, _| q.eq_ignore_ascii_case("Nonexistent Show"))
            .times(1)
            .returning(|_, _| Ok(vec![]));

        let titles = vec![
            "Cowboy Bebop".to_string(),
            "Mushishi".to_string(),
            "Nonexistent Show".to_string(),
        ];
        let records = catalog();
        let seeds = resolve_seeds(&titles, &records, &client).await;

        let found: Vec<(&str, u32)> = seeds
            .found
            .iter()
            .map(|(input, r)| (input.as_str(), r.mal_id))
            .collect();
        assert_eq!(found, vec![("Cowboy Bebop", 1), ("Mushishi", 457)]);
        assert_eq!(seeds.not_found, vec!["Nonexistent Show".to_string()]);
        // Search results are not added to the catalog
        assert_eq!(records.len(), 4);
    }

    #[tokio::test]
    async fn test_resolve_seeds_search_error_counts_as_not_found() {
        let mut client = MockCatalogClient::new();
        client
            .expect_search()
            .returning(|_, _| Err(AppError::ExternalApi("rate limited".to_string())));

        let seeds = resolve_seeds(&["Mushishi".to_string()], &catalog(), &client).await;

        assert!(seeds.is_empty());
        assert_eq!(seeds.not_found, vec!["Mushishi".to_string()]);
    }

    #[tokio::test]
    async fn test_aliases_of_one_show_yield_one_seed() {
        let client = MockCatalogClient::new();
        let titles = vec![
            "Attack on Titan".to_string(),
            "Shingeki no Kyojin".to_string(),
        ];

        let seeds = resolve_seeds(&titles, &catalog(), &client).await;

        let inputs: Vec<&str> = seeds.found.iter().map(|(input, _)| input.as_str()).collect();
        assert_eq!(inputs, vec!["Attack on Titan", "Shingeki no Kyojin"]);
        let records = seeds.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].mal_id, 16498);
    }
}
