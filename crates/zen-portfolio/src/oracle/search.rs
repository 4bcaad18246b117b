//! Search-Grounded Price Oracle
//!
//! Asks an LLM with live web search for the current DOJI gold quote and the
//! Binance P2P USDT/VND rate, constrained to a two-field JSON schema.
//!
//! ```text
//! fetch_prices()
//!   ├─ complete(PRICE_QUERY, web_search + schema)
//!   │    ├─ Ok + valid quote ──► Live, remember as last known good
//!   │    └─ any error ─────────► Fallback(last known good | hardcoded)
//!   └─ never errors
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use zen_llm::{GenerationOptions, LlmProvider, Message};

use super::{PriceOracle, fallback_prices};
use crate::error::{PortfolioError, Result};
use crate::fetch::Fetched;
use crate::model::MarketPrices;

/// Question sent to the search-grounded model
pub const PRICE_QUERY: &str = "Get the current DOJI Gold price per tael (lượng) and the current \
USDT/VND exchange rate on Binance P2P in Vietnam. Provide only the numerical values.";

/// Response schema the model must fill
pub fn price_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "gold_price_vnd": {
                "type": "NUMBER",
                "description": "DOJI Gold SJC price per tael in VND"
            },
            "usdt_price_vnd": {
                "type": "NUMBER",
                "description": "USDT price in VND"
            }
        },
        "required": ["gold_price_vnd", "usdt_price_vnd"]
    })
}

#[derive(Deserialize)]
struct PriceQuote {
    #[serde(with = "rust_decimal::serde::float")]
    gold_price_vnd: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    usdt_price_vnd: Decimal,
}

/// Price oracle backed by a search-capable LLM
pub struct SearchPriceOracle {
    provider: Arc<dyn LlmProvider>,
    options: GenerationOptions,
    last_known_good: RwLock<Option<MarketPrices>>,
}

impl SearchPriceOracle {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            options: GenerationOptions::default()
                .with_temperature(0.0)
                .with_web_search()
                .with_json_schema(price_schema()),
            last_known_good: RwLock::new(None),
        }
    }

    /// Use a specific model instead of the provider default
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.options = self.options.with_model(model);
        self
    }

    /// Last successfully fetched live prices
    pub async fn last_known_good(&self) -> Option<MarketPrices> {
        self.last_known_good.read().await.clone()
    }

    async fn query(&self) -> Result<MarketPrices> {
        let completion = self
            .provider
            .complete(&[Message::user(PRICE_QUERY)], &self.options)
            .await?;

        parse_quote(&completion.content)
    }
}

#[async_trait]
impl PriceOracle for SearchPriceOracle {
    async fn fetch_prices(&self) -> Fetched<MarketPrices> {
        match self.query().await {
            Ok(prices) => {
                debug!(
                    gold = %prices.gold_price_per_unit,
                    stablecoin = %prices.stablecoin_price,
                    provider = self.provider.name(),
                    "Fetched live prices"
                );
                *self.last_known_good.write().await = Some(prices.clone());
                Fetched::live(prices)
            }
            Err(e) => {
                let remembered = self.last_known_good.read().await.clone();
                match remembered {
                    Some(prices) => {
                        warn!(error = %e, "Price lookup failed, using last known prices");
                        Fetched::fallback(prices.refreshed(), format!("price lookup failed, using last known prices: {e}"))
                    }
                    None => {
                        warn!(error = %e, "Price lookup failed, using default prices");
                        Fetched::fallback(fallback_prices(), format!("price lookup failed, using default prices: {e}"))
                    }
                }
            }
        }
    }

    fn name(&self) -> &str {
        "search"
    }
}

/// Parse the model's answer into prices. Both fields must be present, numeric
/// and strictly positive.
pub(crate) fn parse_quote(text: &str) -> Result<MarketPrices> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(PortfolioError::InvalidQuote("empty response".into()));
    }

    let quote: PriceQuote = serde_json::from_str(body)
        .map_err(|e| PortfolioError::InvalidQuote(format!("schema mismatch: {e}")))?;

    if quote.gold_price_vnd <= Decimal::ZERO || quote.usdt_price_vnd <= Decimal::ZERO {
        return Err(PortfolioError::InvalidQuote(format!(
            "non-positive price: gold={}, usdt={}",
            quote.gold_price_vnd, quote.usdt_price_vnd
        )));
    }

    Ok(MarketPrices::new(quote.gold_price_vnd, quote.usdt_price_vnd))
}

/// Remove a surrounding Markdown code fence (```json ... ```), if any
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // drop the info string (`json`) up to the first newline
    let rest = rest.find('\n').map_or("", |i| &rest[i + 1..]);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
