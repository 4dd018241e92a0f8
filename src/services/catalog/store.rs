use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::{
    error::{AppError, AppResult},
    models::AnimeRecord,
    services::catalog::CatalogClient,
};

const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Immutable view of the candidate pool at one point in time
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    records: Vec<AnimeRecord>,
    fetched_at: Option<DateTime<Utc>>,
}

impl CatalogSnapshot {
    pub fn new(records: Vec<AnimeRecord>) -> Self {
        Self {
            records,
            fetched_at: Some(Utc::now()),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[AnimeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// When the snapshot was fetched, `None` if it never was
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }
}

/// Holds the current catalog snapshot and refreshes it from a `CatalogClient`
///
/// Readers clone the `Arc` and work on a consistent snapshot; a refresh
/// builds a new snapshot off to the side and swaps it in whole.
pub struct CatalogStore {
    client: Arc<dyn CatalogClient>,
    current: RwLock<Arc<CatalogSnapshot>>,
    refresh_lock: Mutex<()>,
}

impl CatalogStore {
    /// Creates a store with an empty snapshot
    pub fn new(client: Arc<dyn CatalogClient>) -> Self {
        Self::with_snapshot(client, CatalogSnapshot::empty())
    }

    /// Creates a store seeded with an existing snapshot
    pub fn with_snapshot(client: Arc<dyn CatalogClient>, snapshot: CatalogSnapshot) -> Self {
        Self {
            client,
            current: RwLock::new(Arc::new(snapshot)),
            refresh_lock: Mutex::new(()),
        }
    }

    /// The upstream client backing this store
    pub fn client(&self) -> &dyn CatalogClient {
        self.client.as_ref()
    }

    /// Returns the current snapshot
    pub async fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.current.read().await.clone()
    }

    /// Fetches a fresh pool and swaps it in
    ///
    /// On failure, or when upstream returns nothing, the previous snapshot
    /// stays in place.
    pub async fn refresh(&self) -> AppResult<Arc<CatalogSnapshot>> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> AppResult<Arc<CatalogSnapshot>> {
        let records = self.client.fetch_all().await?;

        if records.is_empty() {
            return Err(AppError::CatalogUnavailable(format!(
                "{} returned an empty catalog",
                self.client.name()
            )));
        }

        let snapshot = Arc::new(CatalogSnapshot::new(records));
        *self.current.write().await = snapshot.clone();

        tracing::info!(
            records = snapshot.len(),
            provider = self.client.name(),
            "Catalog snapshot replaced"
        );

        Ok(snapshot)
    }

    /// Returns the current snapshot, loading it first if it is empty
    ///
    /// A failed load is logged and the empty snapshot returned, so callers
    /// still get seed search and a "no recommendations" answer.
    pub async fn ensure_loaded(&self) -> Arc<CatalogSnapshot> {
        let snapshot = self.snapshot().await;
        if !snapshot.is_empty() {
            return snapshot;
        }

        let _guard = self.refresh_lock.lock().await;

        // Another request may have loaded it while we waited
        let snapshot = self.snapshot().await;
        if !snapshot.is_empty() {
            return snapshot;
        }

        match self.refresh_locked().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "Catalog load failed, continuing with empty pool");
                snapshot
            }
        }
    }

    /// Spawns a task that refreshes the catalog every `interval`
    ///
    /// The first tick fires immediately, which doubles as the startup load.
    /// Intervals below one second are raised to one second.
    pub fn spawn_refresher(self: &Arc<Self>, interval: Duration) -> CatalogRefresherHandle {
        let interval = interval.max(MIN_REFRESH_INTERVAL);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let store = Arc::clone(self);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            tracing::info!(interval_secs = interval.as_secs(), "Catalog refresher started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = store.refresh().await {
                            tracing::error!(error = %e, "Catalog refresh failed, keeping previous snapshot");
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        tracing::info!("Catalog refresher stopped");
                        break;
                    }
                }
            }
        });

        CatalogRefresherHandle { shutdown_tx, task }
    }
}

/// Handle for stopping the background catalog refresher
pub struct CatalogRefresherHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl CatalogRefresherHandle {
    /// Signals the refresher to stop and waits for it
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Catalog refresher task panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog::MockCatalogClient;
    use std::collections::BTreeSet;

    fn record(mal_id: u32, title: &str) -> AnimeRecord {
        let mut record = AnimeRecord::new(mal_id, title);
        record.score = 8.0;
        record.genres = BTreeSet::from(["Action".to_string()]);
        record
    }

    fn mock_with(records: Vec<AnimeRecord>, times: usize) -> MockCatalogClient {
        let mut mock = MockCatalogClient::new();
        mock.expect_fetch_all()
            .times(times)
            .returning(move || Ok(records.clone()));
        mock.expect_name().return_const("mock");
        mock
    }

    #[tokio::test]
    async fn test_new_store_is_empty() {
        let store = CatalogStore::new(Arc::new(MockCatalogClient::new()));
        let snapshot = store.snapshot().await;
        assert!(snapshot.is_empty());
        assert!(snapshot.fetched_at().is_none());
    }

    #[tokio::test]
    async fn test_refresh_swaps_snapshot() {
        let store = CatalogStore::new(Arc::new(mock_with(vec![record(1, "Trigun")], 1)));
        let before = store.snapshot().await;

        tokio_test::assert_ok!(store.refresh().await);

        let after = store.snapshot().await;
        assert_eq!(after.len(), 1);
        assert!(after.fetched_at().is_some());
        // Readers holding the old snapshot are unaffected
        assert!(before.is_empty());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_snapshot() {
        let mut mock = MockCatalogClient::new();
        mock.expect_fetch_all()
            .returning(|| Err(AppError::ExternalApi("boom".to_string())));
        mock.expect_name().return_const("mock");

        let store = CatalogStore::with_snapshot(
            Arc::new(mock),
            CatalogSnapshot::new(vec![record(1, "Trigun")]),
        );

        tokio_test::assert_err!(store.refresh().await);
        assert_eq!(store.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_refresh_keeps_previous_snapshot() {
        let store = CatalogStore::with_snapshot(
            Arc::new(mock_with(vec![], 1)),
            CatalogSnapshot::new(vec![record(1, "Trigun")]),
        );

        let result = store.refresh().await;

        assert!(matches!(result, Err(AppError::CatalogUnavailable(_))));
        assert_eq!(store.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn test_ensure_loaded_fetches_once() {
        let store = CatalogStore::new(Arc::new(mock_with(vec![record(1, "Trigun")], 1)));

        assert_eq!(store.ensure_loaded().await.len(), 1);
        // Second call is served from the snapshot
        assert_eq!(store.ensure_loaded().await.len(), 1);
    }

    #[tokio::test]
    async fn test_ensure_loaded_degrades_to_empty() {
        let mut mock = MockCatalogClient::new();
        mock.expect_fetch_all()
            .returning(|| Err(AppError::ExternalApi("down".to_string())));
        mock.expect_name().return_const("mock");

        let store = CatalogStore::new(Arc::new(mock));
        assert!(store.ensure_loaded().await.is_empty());
    }

    #[tokio::test]
    async fn test_refresher_loads_and_stops() {
        let store = Arc::new(CatalogStore::new(Arc::new(mock_with(
            vec![record(1, "Trigun"), record(2, "Monster")],
            1,
        ))));

        let handle = store.spawn_refresher(Duration::from_secs(3600));
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.shutdown().await;

        assert_eq!(store.snapshot().await.len(), 2);
    }

    #[tokio::test]
    async fn test_refresher_survives_zero_interval() {
        // fetch_all must run exactly once: the first tick, then the raised interval
        let store = Arc::new(CatalogStore::new(Arc::new(mock_with(
            vec![record(1, "Trigun")],
            1,
        ))));

        let handle = store.spawn_refresher(Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!handle.task.is_finished());
        handle.shutdown().await;
        assert_eq!(store.snapshot().await.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_readers_see_whole_snapshots() {
        let old_pool: Vec<AnimeRecord> = (1..=100).map(|id| record(id, "Old")).collect();
        let new_pool: Vec<AnimeRecord> = (1001..=1150).map(|id| record(id, "New")).collect();

        let mut mock = MockCatalogClient::new();
        mock.expect_fetch_all()
            .returning(move || Ok(new_pool.clone()));
        mock.expect_name().return_const("mock");

        let store = Arc::new(CatalogStore::with_snapshot(
            Arc::new(mock),
            CatalogSnapshot::new(old_pool),
        ));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    for _ in 0..500 {
                        let snapshot = store.snapshot().await;
                        let ids: Vec<u32> = snapshot.records().iter().map(|r| r.mal_id).collect();
                        let whole_old = ids.len() == 100 && ids.iter().all(|id| *id <= 100);
                        let whole_new = ids.len() == 150 && ids.iter().all(|id| *id > 1000);
                        assert!(whole_old || whole_new, "torn snapshot of {} records", ids.len());
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        for _ in 0..20 {
            tokio_test::assert_ok!(store.refresh().await);
        }

        for reader in readers {
            reader.await.unwrap();
        }
        assert_eq!(store.snapshot().await.len(), 150);
    }
}
