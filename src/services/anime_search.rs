use crate::{
    error::{AppError, AppResult},
    models::AnimeRecord,
    services::catalog::CatalogClient,
};

/// Searches the upstream catalog by title
///
/// Delegates to the configured `CatalogClient`, keeping HTTP routing apart
/// from upstream access. An empty result is reported as `NotFound`.
pub async fn search_anime(
    client: &dyn CatalogClient,
    query: &str,
    limit: usize,
) -> AppResult<Vec<AnimeRecord>> {
    let mut results = client.search(query, limit).await?;

    if results.is_empty() {
        return Err(AppError::NotFound(format!(
            "No anime found matching '{}'",
            query
        )));
    }

    results.truncate(limit);
    Ok(results)
}
