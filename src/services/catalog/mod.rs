/// Anime catalog sources and the in-memory catalog snapshot
///
/// A `CatalogClient` knows how to pull anime records from an upstream API;
/// the `CatalogStore` keeps the latest full pull as an immutable snapshot
/// that request handlers read without coordination.
use crate::{error::AppResult, models::AnimeRecord};

pub mod jikan;
pub mod retry;
pub mod store;

pub use jikan::JikanClient;
pub use store::{CatalogRefresherHandle, CatalogSnapshot, CatalogStore};

/// Trait for anime catalog providers
///
/// Scoring only depends on the record shapes returned here, never on how
/// they were fetched, paginated or retried.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch the full candidate pool
    ///
    /// Implementations page through the upstream listing and handle rate
    /// limiting and retries themselves.
    async fn fetch_all(&self) -> AppResult<Vec<AnimeRecord>>;

    /// Search the upstream catalog by title, best matches first
    ///
    /// Returns at most `limit` records.
    async fn search(&self, query: &str, limit: usize) -> AppResult<Vec<AnimeRecord>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
