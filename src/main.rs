use std::sync::Arc;

use anime_rec_api::{
    cache::{create_redis_client, Cache},
    config::Config,
    routes::{create_router, AppState},
    services::{CatalogClient, CatalogStore, JikanClient},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("anime_rec_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    // Redis is optional; without it every page is fetched from Jikan
    let (cache, cache_handle) = match config.redis_url.as_deref() {
        Some(url) => {
            let client = create_redis_client(url)?;
            let (cache, handle) = Cache::new(client).await;
            tracing::info!("Redis cache enabled");
            (Some(cache), Some(handle))
        }
        None => {
            tracing::info!("REDIS_URL not set, running without cache");
            (None, None)
        }
    };

    let jikan = JikanClient::new(&config, cache)?;
    tracing::info!(
        provider = jikan.name(),
        api_url = %config.jikan_api_url,
        pages = config.catalog_pages,
        "Catalog client ready"
    );

    let catalog = Arc::new(CatalogStore::new(Arc::new(jikan)));
    let refresher = catalog.spawn_refresher(config.refresh_interval());

    let app = create_router(Arc::new(AppState::new(catalog)));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    refresher.shutdown().await;
    if let Some(handle) = cache_handle {
        handle.shutdown().await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
