/// Jikan (unofficial MyAnimeList) catalog client
///
/// API flow:
/// 1. Candidate pool: `/top/anime?page=N&limit=25`, paged until the configured
///    page count or the last page
/// 2. Title search: `/anime?q=...&order_by=popularity&sort=asc`, paged until
///    the requested number of results
///
/// Jikan rate-limits aggressively (3 req/s), so every request goes through a
/// shared rate limiter and is retried with backoff on 429 and 5xx responses.
use crate::{
    cache::{Cache, CacheKey},
    cached,
    config::Config,
    error::{AppError, AppResult},
    models::{AnimeRecord, JikanListResponse},
    services::catalog::{
        retry::{request_limiter, retry_after, RequestLimiter, RetryPolicy},
        CatalogClient,
    },
};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

const USER_AGENT: &str = concat!("anime-rec-api/", env!("CARGO_PKG_VERSION"));
const PAGE_SIZE: u32 = 25;
/// Jikan tolerates short bursts of 3 requests
const BURST_SIZE: u32 = 3;
const PAGE_CACHE_TTL: u64 = 21600; // 6 hours
const SEARCH_CACHE_TTL: u64 = 3600; // 1 hour

#[derive(Clone)]
pub struct JikanClient {
    http_client: HttpClient,
    api_url: String,
    cache: Option<Cache>,
    limiter: Arc<RequestLimiter>,
    retry_policy: RetryPolicy,
    max_pages: u32,
}

impl JikanClient {
    /// Creates a client from configuration; `cache` is optional
    pub fn new(config: &Config, cache: Option<Cache>) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http_client,
            api_url: config.jikan_api_url.trim_end_matches('/').to_string(),
            cache,
            limiter: Arc::new(request_limiter(config.request_interval(), BURST_SIZE)),
            retry_policy: RetryPolicy::jikan(config.max_retries),
            max_pages: config.catalog_pages.max(1),
        })
    }

    /// Sends a rate-limited GET and decodes the JSON body, retrying transient failures
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);
        let mut attempt = 0;

        loop {
            self.limiter.until_ready().await;

            let server_delay = match self.http_client.get(&url).query(query).send().await {
                Ok(response) if response.status().is_success() => {
                    return response.json::<T>().await.map_err(|e| {
                        tracing::error!(url = %url, error = %e, "Failed to decode Jikan response");
                        AppError::ExternalApi(format!("Failed to parse Jikan response: {}", e))
                    });
                }
                Ok(response) if RetryPolicy::is_retryable_status(response.status()) => {
                    let status = response.status();
                    if attempt >= self.retry_policy.max_retries {
                        return Err(AppError::ExternalApi(format!(
                            "Jikan API returned status {} after {} attempts",
                            status,
                            attempt + 1
                        )));
                    }
                    tracing::warn!(url = %url, status = %status, attempt, "Retryable Jikan response");
                    retry_after(response.headers())
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(AppError::ExternalApi(format!(
                        "Jikan API returned status {}: {}",
                        status, body
                    )));
                }
                Err(e) if RetryPolicy::is_retryable_error(&e)
                    && attempt < self.retry_policy.max_retries =>
                {
                    tracing::warn!(url = %url, error = %e, attempt, "Jikan request failed, retrying");
                    None
                }
                Err(e) => return Err(e.into()),
            };

            let delay = self.retry_policy.delay_for(attempt, server_delay);
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn fetch_top_page_uncached(&self, page: u32) -> AppResult<JikanListResponse> {
        self.get_json(
            "/top/anime",
            &[("page", page.to_string()), ("limit", PAGE_SIZE.to_string())],
        )
        .await
    }

    async fn fetch_top_page(&self, page: u32) -> AppResult<JikanListResponse> {
        match &self.cache {
            Some(cache) => cached!(
                cache,
                CacheKey::TopAnimePage(page),
                PAGE_CACHE_TTL,
                self.fetch_top_page_uncached(page)
            ),
            None => self.fetch_top_page_uncached(page).await,
        }
    }

    async fn search_uncached(&self, query: &str, limit: u32) -> AppResult<Vec<AnimeRecord>> {
        // Page size stays fixed across pages so upstream offsets line up
        let page_size = limit.clamp(1, PAGE_SIZE);
        let mut seen = HashSet::new();
        let mut results = Vec::new();
        let mut page = 1;

        loop {
            let response: JikanListResponse = self
                .get_json(
                    "/anime",
                    &[
                        ("q", query.to_string()),
                        ("page", page.to_string()),
                        ("limit", page_size.to_string()),
                        ("order_by", "popularity".to_string()),
                        ("sort", "asc".to_string()),
                    ],
                )
                .await?;

            let has_next_page = response
                .pagination
                .as_ref()
                .map(|p| p.has_next_page)
                .unwrap_or(false);
            let received = response.data.len();

            results.extend(
                response
                    .data
                    .into_iter()
                    .map(AnimeRecord::from)
                    .filter(|record| seen.insert(record.mal_id)),
            );

            if results.len() >= limit as usize || !has_next_page || received == 0 {
                break;
            }
            page += 1;
        }

        results.truncate(limit as usize);
        Ok(results)
    }
}

#[async_trait::async_trait]
impl CatalogClient for JikanClient {
    async fn fetch_all(&self) -> AppResult<Vec<AnimeRecord>> {
        let start = Instant::now();
        let mut seen = HashSet::new();
        let mut records = Vec::new();
        let mut skipped = 0usize;

        for page in 1..=self.max_pages {
            let response = match self.fetch_top_page(page).await {
                Ok(response) => response,
                Err(e) if !records.is_empty() => {
                    // Keep the pages already fetched
                    tracing::warn!(page, error = %e, "Stopping catalog fetch early");
                    break;
                }
                Err(e) => return Err(e),
            };

            let has_next_page = response
                .pagination
                .as_ref()
                .map(|p| p.has_next_page)
                .unwrap_or(false);

            for anime in response.data {
                let record = AnimeRecord::from(anime);
                if record.is_scorable() && seen.insert(record.mal_id) {
                    records.push(record);
                } else {
                    skipped += 1;
                }
            }

            if !has_next_page {
                break;
            }
        }

        tracing::info!(
            records = records.len(),
            skipped,
            elapsed_ms = start.elapsed().as_millis() as u64,
            provider = self.name(),
            "Catalog fetched"
        );

        Ok(records)
    }

    async fn search(&self, query: &str, limit: usize) -> AppResult<Vec<AnimeRecord>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        let limit = u32::try_from(limit).unwrap_or(u32::MAX).max(1);
        let results: AppResult<Vec<AnimeRecord>> = match &self.cache {
            Some(cache) => cached!(
                cache,
                CacheKey::AnimeSearch {
                    query: query.to_string(),
                    limit,
                },
                SEARCH_CACHE_TTL,
                self.search_uncached(query, limit)
            ),
            None => self.search_uncached(query, limit).await,
        };
        let results = results?;

        tracing::info!(
            query = %query,
            limit,
            results = results.len(),
            provider = self.name(),
            "Anime search completed"
        );

        Ok(results)
    }

    fn name(&self) -> &'static str {
        "jikan"
    }
}
