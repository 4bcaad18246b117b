//! Static Price Oracle
//!
//! Used when no search-capable LLM is configured, and in tests. Always
//! answers with its configured quotes, reported as a fallback.

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::{FALLBACK_GOLD_PRICE, FALLBACK_STABLECOIN_PRICE, PriceOracle};
use crate::fetch::Fetched;
use crate::model::MarketPrices;

/// Oracle with fixed quotes
pub struct StaticPriceOracle {
    gold_price_per_unit: Decimal,
    stablecoin_price: Decimal,
}

impl Default for StaticPriceOracle {
    fn default() -> Self {
        Self::new(FALLBACK_GOLD_PRICE, FALLBACK_STABLECOIN_PRICE)
    }
}

impl StaticPriceOracle {
    pub const fn new(gold_price_per_unit: Decimal, stablecoin_price: Decimal) -> Self {
        Self {
            gold_price_per_unit,
            stablecoin_price,
        }
    }
}

#[async_trait]
impl PriceOracle for StaticPriceOracle {
    async fn fetch_prices(&self) -> Fetched<MarketPrices> {
        Fetched::fallback(
            MarketPrices::new(self.gold_price_per_unit, self.stablecoin_price),
            "static prices: no live price source configured",
        )
    }

    fn name(&self) -> &str {
        "static"
    }
}
