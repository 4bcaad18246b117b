//! Application State

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;
use tracing::{info, warn};

use zen_llm::LlmProvider;
use zen_portfolio::{
    AssetHoldings, FetchStatus, Fetched, MarketPrices, Notifier, PortfolioStatus, PriceOracle,
    RebalanceAdvisor, ResilientHoldingsStore, compute_status,
};

/// Current holdings/prices pair and where each came from.
/// Replaced wholesale, never patched field by field.
#[derive(Clone, Debug)]
pub struct Dashboard {
    pub holdings: AssetHoldings,
    pub holdings_source: FetchStatus,
    pub prices: MarketPrices,
    pub prices_source: FetchStatus,
    pub advice: Option<String>,
}

impl Dashboard {
    fn initial(prices: MarketPrices) -> Self {
        let pending = FetchStatus {
            source: "unavailable",
            reason: Some("not loaded yet".into()),
        };
        Self {
            holdings: AssetHoldings::default(),
            holdings_source: pending.clone(),
            prices,
            prices_source: pending,
            advice: None,
        }
    }

    pub fn status(&self) -> PortfolioStatus {
        compute_status(&self.holdings, &self.prices)
    }
}

/// Single-flight flag for one kind of action
#[derive(Debug, Default)]
pub struct InFlight(AtomicBool);

impl InFlight {
    /// Claim the flag, or `None` when the action is already running
    pub fn try_begin(&self) -> Option<InFlightGuard<'_>> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(self))
    }

    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Releases the flag on drop
pub struct InFlightGuard<'a>(&'a InFlight);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.0.store(false, Ordering::Release);
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Holdings persistence (primary + local cache)
    pub store: Arc<ResilientHoldingsStore>,

    /// Market price source
    pub oracle: Arc<dyn PriceOracle>,

    /// LLM provider (None if no API key)
    pub provider: Option<Arc<dyn LlmProvider>>,

    /// Advice generator (None if no API key)
    pub advisor: Option<Arc<RebalanceAdvisor>>,

    /// Report delivery channel
    pub notifier: Arc<dyn Notifier>,

    pub dashboard: Arc<RwLock<Dashboard>>,

    pub saving: Arc<InFlight>,
    pub notifying: Arc<InFlight>,
}

impl AppState {
    pub fn new(
        store: Arc<ResilientHoldingsStore>,
        oracle: Arc<dyn PriceOracle>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            oracle,
            provider: None,
            advisor: None,
            notifier,
            dashboard: Arc::new(RwLock::new(Dashboard::initial(zen_portfolio::oracle::fallback_prices()))),
            saving: Arc::default(),
            notifying: Arc::default(),
        }
    }

    #[must_use]
    pub fn with_advisor(mut self, provider: Arc<dyn LlmProvider>, advisor: RebalanceAdvisor) -> Self {
        self.provider = Some(provider);
        self.advisor = Some(Arc::new(advisor));
        self
    }

    pub async fn snapshot(&self) -> Dashboard {
        self.dashboard.read().await.clone()
    }

    /// Load holdings and prices concurrently and replace the dashboard.
    ///
    /// Holdings keep their in-memory value when no copy is available at all.
    /// Advice is dropped since it described the previous state.
    pub async fn reload(&self) -> Dashboard {
        let (holdings, prices) = tokio::join!(self.store.fetch_latest(), self.oracle.fetch_prices());

        let holdings_source = holdings.status();
        let prices_source = prices.status();

        if let Some(reason) = holdings.reason() {
            warn!(source = holdings.source(), reason, "Holdings degraded");
        }
        if let Some(reason) = prices.reason() {
            warn!(source = prices.source(), reason, "Prices degraded");
        }

        let mut dashboard = self.dashboard.write().await;
        let holdings = match holdings {
            Fetched::Live { value } | Fetched::Fallback { value, .. } => value.unwrap_or_default(),
            Fetched::Unavailable { .. } => dashboard.holdings.clone(),
        };
        let prices = prices.into_value().unwrap_or_else(|| dashboard.prices.clone());

        *dashboard = Dashboard {
            holdings,
            holdings_source,
            prices,
            prices_source,
            advice: None,
        };

        info!(
            holdings = dashboard.holdings_source.source,
            prices = dashboard.prices_source.source,
            "Dashboard loaded"
        );
        dashboard.clone()
    }
}
