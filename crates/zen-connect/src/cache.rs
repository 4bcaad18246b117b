//! Local Cache Store
//!
//! The latest holdings as one JSON document on disk. Serves as the fallback
//! replica behind a remote store, or as the primary when none is configured.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use zen_portfolio::{AssetHoldings, HoldingsStore};

use crate::error::Result;

/// Cache location used when `HOLDINGS_CACHE_PATH` is not set
pub const DEFAULT_CACHE_PATH: &str = ".zenwealth/holdings.json";

/// `HoldingsStore` over a single JSON file
#[derive(Clone, Debug)]
pub struct LocalCacheStore {
    path: PathBuf,
}

impl Default for LocalCacheStore {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_PATH)
    }
}

impl LocalCacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write to a sibling temp file, then rename over the target so readers
    /// never see a partial document
    async fn write(&self, holdings: &AssetHoldings) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(holdings)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), "Wrote holdings cache");
        Ok(())
    }

    async fn read(&self) -> Result<Option<AssetHoldings>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl HoldingsStore for LocalCacheStore {
    fn name(&self) -> &str {
        "local-cache"
    }

    async fn put(&self, holdings: &AssetHoldings) -> zen_portfolio::Result<()> {
        Ok(self.write(holdings).await?)
    }

    async fn fetch_latest(&self) -> zen_portfolio::Result<Option<AssetHoldings>> {
        Ok(self.read().await?)
    }
}
