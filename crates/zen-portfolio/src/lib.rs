//! # zen-portfolio
//!
//! Equal-weight tracker for a three-asset portfolio: physical gold, VND
//! savings and a USDT stablecoin balance.
//!
//! ## Allocation Rule
//!
//! Each asset class targets one third of the total value. An asset drifting
//! more than 5 percentage points from 33.33% is out of balance.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Total 116,700,000 VND                                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  GOLD       ███████████████████    35.35%  (+2.02)   ok     │
//! │  SAVINGS    ██████████████████████ 42.84%  (+9.51)   SELL   │
//! │  STABLECOIN ███████████            21.81% (-11.52)   BUY    │
//! │             target ─────────────── 33.33%  ±5               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Components
//!
//! - [`engine`] - pure `(holdings, prices) → status` computation
//! - [`oracle`] - market prices, live or degraded, never failing
//! - [`store`] - holdings persistence contract and primary/cache composition
//! - [`advice`] - LLM-written rebalancing guidance
//! - [`notify`] / [`report`] - chat report rendering and delivery contract

pub mod advice;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod model;
pub mod notify;
pub mod oracle;
pub mod report;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use advice::{NO_ADVICE, RebalanceAdvisor};
pub use engine::{REBALANCE_THRESHOLD, RebalanceAction, RebalanceTrade, TARGET_PERCENTAGE, compute_status, rebalance_plan};
pub use error::{PortfolioError, Result};
pub use fetch::{FetchStatus, Fetched};
pub use model::{AssetHoldings, AssetStatus, AssetType, MAX_QUANTITY, MarketPrices, PortfolioStatus};
pub use notify::{Delivery, Notifier};
pub use oracle::{PriceOracle, SearchPriceOracle, StaticPriceOracle};
pub use report::{Locale, render_report};
pub use store::{HoldingsStore, MemoryHoldingsStore, ResilientHoldingsStore};
