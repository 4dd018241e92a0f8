/// Read-through caching for upstream responses stored in Redis.
///
/// Looks the key up in the cache and returns the cached value on a hit.
/// On a miss the block is awaited, its value is handed to the background
/// writer and then returned. A failed cache read is logged and treated as
/// a miss so that Redis outages only cost latency.
///
/// # Arguments
/// * `$cache`: a [`Cache`](crate::cache::Cache) (anything with
///   `get_from_cache` and `set_in_background`).
/// * `$key`: the [`CacheKey`](crate::cache::CacheKey) to read and write.
/// * `$ttl`: time-to-live of the stored value, in seconds.
/// * `$block`: future producing `AppResult<T>` on a miss.
///
/// # Example
/// ```rust,ignore
/// let page: JikanListResponse = cached!(cache, CacheKey::TopAnimePage(1), 3600, async move {
///     client.fetch_top_page_uncached(1).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match $cache.get_from_cache(&key).await {
            Ok(Some(cached)) => {
                tracing::debug!(key = %key, "Cache hit");
                Ok(cached)
            }
            lookup => {
                if let Err(e) = lookup {
                    tracing::warn!(key = %key, error = %e, "Cache read failed, fetching upstream");
                }
                let value = $block.await?;
                $cache.set_in_background(&key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
