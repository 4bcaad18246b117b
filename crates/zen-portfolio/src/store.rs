//! Holdings Store
//!
//! Durable storage of the latest holdings record. Backends (Supabase, a local
//! JSON file) live in `zen-connect`; this module owns the contract, an
//! in-memory backend and the primary-plus-cache composition.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::Result;
use crate::fetch::Fetched;
use crate::model::AssetHoldings;

/// Holdings persistence backend (Strategy pattern)
#[async_trait]
pub trait HoldingsStore: Send + Sync {
    /// Backend name for logs and health output
    fn name(&self) -> &str;

    /// Write `holdings` exactly as given
    async fn put(&self, holdings: &AssetHoldings) -> Result<()>;

    /// Persist one record stamped with a fresh `updated_at` and return it
    async fn save(&self, holdings: &AssetHoldings) -> Result<AssetHoldings> {
        let stamped = holdings.clone().stamped(Utc::now());
        self.put(&stamped).await?;
        Ok(stamped)
    }

    /// Most recent record. `Ok(None)` when nothing was ever written.
    async fn fetch_latest(&self) -> Result<Option<AssetHoldings>>;
}

/// In-process store. Used when no persistence is configured and in tests.
#[derive(Default)]
pub struct MemoryHoldingsStore {
    latest: RwLock<Option<AssetHoldings>>,
}

impl MemoryHoldingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HoldingsStore for MemoryHoldingsStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn put(&self, holdings: &AssetHoldings) -> Result<()> {
        let mut latest = self.latest.write().await;
        let is_newer = latest
            .as_ref()
            .is_none_or(|current| holdings.updated_at >= current.updated_at);
        if is_newer {
            *latest = Some(holdings.clone());
        }
        Ok(())
    }

    async fn fetch_latest(&self) -> Result<Option<AssetHoldings>> {
        Ok(self.latest.read().await.clone())
    }
}

/// Primary store with an optional local cache behind it.
///
/// ```text
/// save:   primary ok ──► Live       (cache refreshed, best effort)
///         primary err ─► cache ok ─► Fallback
///                        cache err ► Unavailable
///
/// fetch:  primary ok ──► Live(Some | None)
///         primary err ─► cache Some ► Fallback
///                        otherwise ─► Unavailable
/// ```
pub struct ResilientHoldingsStore {
    primary: Arc<dyn HoldingsStore>,
    cache: Option<Arc<dyn HoldingsStore>>,
}

impl ResilientHoldingsStore {
    pub fn new(primary: Arc<dyn HoldingsStore>) -> Self {
        Self { primary, cache: None }
    }

    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn HoldingsStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn primary_name(&self) -> &str {
        self.primary.name()
    }

    pub fn cache_name(&self) -> Option<&str> {
        self.cache.as_deref().map(|cache| cache.name())
    }

    pub async fn save(&self, holdings: &AssetHoldings) -> Fetched<AssetHoldings> {
        let primary_error = match self.primary.save(holdings).await {
            Ok(saved) => {
                debug!(store = self.primary.name(), "Saved holdings");
                if let Some(cache) = &self.cache {
                    if let Err(e) = cache.put(&saved).await {
                        warn!(cache = cache.name(), error = %e, "Failed to refresh holdings cache");
                    }
                }
                return Fetched::live(saved);
            }
            Err(e) => e,
        };

        warn!(store = self.primary.name(), error = %primary_error, "Primary store rejected holdings");

        let Some(cache) = &self.cache else {
            return Fetched::unavailable(format!("save failed: {primary_error}"));
        };

        match cache.save(holdings).await {
            Ok(saved) => Fetched::fallback(
                saved,
                format!("primary store failed, saved to local cache: {primary_error}"),
            ),
            Err(cache_error) => {
                warn!(cache = cache.name(), error = %cache_error, "Local cache write failed");
                Fetched::unavailable(format!(
                    "save failed: {primary_error}; local cache failed: {cache_error}"
                ))
            }
        }
    }

    pub async fn fetch_latest(&self) -> Fetched<Option<AssetHoldings>> {
        let primary_error = match self.primary.fetch_latest().await {
            Ok(latest) => return Fetched::live(latest),
            Err(e) => e,
        };

        warn!(store = self.primary.name(), error = %primary_error, "Primary store read failed");

        let Some(cache) = &self.cache else {
            return Fetched::unavailable(format!("load failed: {primary_error}"));
        };

        match cache.fetch_latest().await {
            Ok(Some(cached)) => Fetched::fallback(
                Some(cached),
                format!("primary store failed, using local cache: {primary_error}"),
            ),
            Ok(None) => Fetched::unavailable(format!(
                "load failed: {primary_error}; local cache is empty"
            )),
            Err(cache_error) => Fetched::unavailable(format!(
                "load failed: {primary_error}; local cache failed: {cache_error}"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PortfolioError;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    struct FailingStore;

    #[async_trait]
    impl HoldingsStore for FailingStore {
        fn name(&self) -> &str {
            "failing"
        }

        async fn put(&self, _holdings: &AssetHoldings) -> Result<()> {
            Err(PortfolioError::StoreUnavailable("connection refused".into()))
        }

        async fn fetch_latest(&self) -> Result<Option<AssetHoldings>> {
            Err(PortfolioError::StoreUnavailable("connection refused".into()))
        }
    }

    fn sample() -> AssetHoldings {
        AssetHoldings::new(dec!(5), dec!(50000000), dec!(1000))
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryHoldingsStore::new();
        assert!(store.fetch_latest().await.unwrap().is_none());

        let before = Utc::now();
        let saved = store.save(&sample()).await.unwrap();
        assert!(saved.updated_at >= before);

        let latest = store.fetch_latest().await.unwrap().unwrap();
        assert_eq!(latest, saved);
    }

    #[tokio::test]
    async fn test_memory_store_keeps_most_recent() {
        let store = MemoryHoldingsStore::new();
        let newer = sample().stamped(Utc::now());
        let older = AssetHoldings::default().stamped(newer.updated_at - Duration::hours(1));

        store.put(&newer).await.unwrap();
        store.put(&older).await.unwrap();

        assert_eq!(store.fetch_latest().await.unwrap().unwrap(), newer);
    }

    #[tokio::test]
    async fn test_resilient_save_live_refreshes_cache() {
        let primary = Arc::new(MemoryHoldingsStore::new());
        let cache = Arc::new(MemoryHoldingsStore::new());
        let store = ResilientHoldingsStore::new(primary.clone()).with_cache(cache.clone());

        let fetched = store.save(&sample()).await;
        assert!(fetched.is_live());
        let saved = fetched.into_value().unwrap();

        assert_eq!(primary.fetch_latest().await.unwrap().unwrap(), saved);
        assert_eq!(cache.fetch_latest().await.unwrap().unwrap(), saved);
    }

    #[tokio::test]
    async fn test_resilient_save_falls_back_to_cache() {
        let cache = Arc::new(MemoryHoldingsStore::new());
        let store = ResilientHoldingsStore::new(Arc::new(FailingStore)).with_cache(cache.clone());

        let fetched = store.save(&sample()).await;
        assert!(matches!(fetched, Fetched::Fallback { .. }));
        assert!(fetched.reason().unwrap().contains("connection refused"));
        assert_eq!(cache.fetch_latest().await.unwrap().unwrap().gold_weight, dec!(5));
    }

    #[tokio::test]
    async fn test_resilient_save_unavailable_when_both_fail() {
        let store = ResilientHoldingsStore::new(Arc::new(FailingStore)).with_cache(Arc::new(FailingStore));
        assert!(matches!(store.save(&sample()).await, Fetched::Unavailable { .. }));

        let store = ResilientHoldingsStore::new(Arc::new(FailingStore));
        assert!(matches!(store.save(&sample()).await, Fetched::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_resilient_fetch_empty_primary_is_live_none() {
        let cache = Arc::new(MemoryHoldingsStore::new());
        cache.save(&sample()).await.unwrap();
        let store = ResilientHoldingsStore::new(Arc::new(MemoryHoldingsStore::new())).with_cache(cache);

        let fetched = store.fetch_latest().await;
        assert!(fetched.is_live());
        assert_eq!(fetched.into_value(), Some(None));
    }

    #[tokio::test]
    async fn test_resilient_fetch_falls_back_to_cache() {
        let cache = Arc::new(MemoryHoldingsStore::new());
        let cached = cache.save(&sample()).await.unwrap();
        let store = ResilientHoldingsStore::new(Arc::new(FailingStore)).with_cache(cache);

        let fetched = store.fetch_latest().await;
        assert!(fetched.is_degraded());
        assert_eq!(fetched.into_value(), Some(Some(cached)));
    }

    #[tokio::test]
    async fn test_resilient_fetch_unavailable() {
        let store = ResilientHoldingsStore::new(Arc::new(FailingStore))
            .with_cache(Arc::new(MemoryHoldingsStore::new()));
        let fetched = store.fetch_latest().await;
        assert!(matches!(fetched, Fetched::Unavailable { .. }));
        assert!(fetched.reason().unwrap().contains("empty"));

        let store = ResilientHoldingsStore::new(Arc::new(FailingStore));
        assert!(store.fetch_latest().await.value().is_none());
        assert_eq!(store.cache_name(), None);
        assert_eq!(store.primary_name(), "failing");
    }
}
