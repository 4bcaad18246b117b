//! Price Oracles
//!
//! Sources of current market prices. Implement `PriceOracle` for each source:
//! AI-grounded search, fixed quotes, a real market data API, etc.
//!
//! An oracle never fails the caller. When the source is down it answers with
//! degraded prices and says so through `Fetched::Fallback`.

mod fixed;
mod search;

pub use fixed::StaticPriceOracle;
pub use search::{PRICE_QUERY, SearchPriceOracle, price_schema};

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::fetch::Fetched;
use crate::model::MarketPrices;

/// Gold price per lượng used when no quote was ever obtained
pub const FALLBACK_GOLD_PRICE: Decimal = Decimal::from_parts(82_500_000, 0, 0, false, 0);

/// Stablecoin price used when no quote was ever obtained
pub const FALLBACK_STABLECOIN_PRICE: Decimal = Decimal::from_parts(25_450, 0, 0, false, 0);

/// Hardcoded prices, timestamped now
pub fn fallback_prices() -> MarketPrices {
    MarketPrices::new(FALLBACK_GOLD_PRICE, FALLBACK_STABLECOIN_PRICE)
}

/// Market price source (Strategy pattern)
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Current prices. `Live` or `Fallback`, never `Unavailable`.
    async fn fetch_prices(&self) -> Fetched<MarketPrices>;

    /// Oracle name for logs and health output
    fn name(&self) -> &str;
}
