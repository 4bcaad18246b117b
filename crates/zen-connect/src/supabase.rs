//! Supabase Holdings Store
//!
//! Append-only holdings history over the PostgREST API. Every save inserts a
//! row; the latest row by `updatedAt` is the current record.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use zen_portfolio::{AssetHoldings, HoldingsStore};

use crate::error::{ConnectError, Result};

/// Table used when `SUPABASE_TABLE` is not set
pub const DEFAULT_TABLE: &str = "holdings";

/// Supabase connection settings
#[derive(Clone, Debug)]
pub struct SupabaseConfig {
    /// Project URL, without trailing slash
    pub url: String,

    /// anon or service key
    pub key: String,

    pub table: String,
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            key: key.into(),
            table: DEFAULT_TABLE.into(),
        }
    }

    /// Read `SUPABASE_URL`, `SUPABASE_KEY` and `SUPABASE_TABLE`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let url = lookup("SUPABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConnectError::Config("SUPABASE_URL not set".into()))?;
        let key = lookup("SUPABASE_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConnectError::Config("SUPABASE_KEY not set".into()))?;

        let mut config = Self::new(url, key);
        if let Some(table) = lookup("SUPABASE_TABLE").filter(|t| !t.trim().is_empty()) {
            config.table = table;
        }
        Ok(config)
    }
}

/// One row of the holdings table, in the persisted record shape
/// `{goldWeight, savingsAmount, stablecoinAmount, updatedAt}`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HoldingsRow {
    #[serde(with = "rust_decimal::serde::float")]
    gold_weight: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    savings_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    stablecoin_amount: Decimal,
    updated_at: DateTime<Utc>,
}

impl From<&AssetHoldings> for HoldingsRow {
    fn from(h: &AssetHoldings) -> Self {
        Self {
            gold_weight: h.gold_weight,
            savings_amount: h.savings_amount,
            stablecoin_amount: h.stablecoin_amount,
            updated_at: h.updated_at,
        }
    }
}

impl From<HoldingsRow> for AssetHoldings {
    fn from(row: HoldingsRow) -> Self {
        Self::new(row.gold_weight, row.savings_amount, row.stablecoin_amount).stamped(row.updated_at)
    }
}

/// `HoldingsStore` backed by a Supabase table
pub struct SupabaseHoldingsStore {
    client: Client,
    config: SupabaseConfig,
}

impl SupabaseHoldingsStore {
    pub fn new(config: SupabaseConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::new(SupabaseConfig::from_env()?))
    }

    pub const fn config(&self) -> &SupabaseConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/rest/v1/{}", self.config.url, self.config.table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.config.key)
            .bearer_auth(&self.config.key)
    }

    async fn insert(&self, row: &HoldingsRow) -> Result<()> {
        let response = self
            .authorized(self.client.post(self.endpoint()))
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConnectError::api("Supabase", status, body));
        }

        debug!(table = %self.config.table, "Inserted holdings row");
        Ok(())
    }

    async fn latest_row(&self) -> Result<Option<HoldingsRow>> {
        let response = self
            .authorized(self.client.get(self.endpoint()))
            .query(&[("select", "*"), ("order", "updatedAt.desc"), ("limit", "1")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConnectError::api("Supabase", status, body));
        }

        let rows: Vec<HoldingsRow> = response.json().await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl HoldingsStore for SupabaseHoldingsStore {
    fn name(&self) -> &str {
        "supabase"
    }

    async fn put(&self, holdings: &AssetHoldings) -> zen_portfolio::Result<()> {
        Ok(self.insert(&HoldingsRow::from(holdings)).await?)
    }

    async fn fetch_latest(&self) -> zen_portfolio::Result<Option<AssetHoldings>> {
        Ok(self.latest_row().await?.map(AssetHoldings::from))
    }
}
