//! HTTP Handlers

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use zen_portfolio::{
    AssetHoldings, Delivery, FetchStatus, Fetched, MarketPrices, NO_ADVICE, PortfolioError,
    PortfolioStatus, RebalanceTrade, rebalance_plan,
};

use crate::state::{AppState, Dashboard};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub price_source: String,
    /// None when no LLM is configured
    pub llm_connected: Option<bool>,
    pub store: String,
    pub cache: Option<String>,
    pub notifier_configured: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub holdings: AssetHoldings,
    pub holdings_source: FetchStatus,
    pub prices: MarketPrices,
    pub prices_source: FetchStatus,
    pub status: PortfolioStatus,
    pub plan: [RebalanceTrade; 3],
    pub needs_rebalancing: bool,
    pub is_empty: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advice: Option<String>,
}

impl From<Dashboard> for DashboardResponse {
    fn from(dashboard: Dashboard) -> Self {
        let status = dashboard.status();
        Self {
            plan: rebalance_plan(&status),
            needs_rebalancing: status.needs_rebalancing(),
            is_empty: status.is_empty(),
            status,
            holdings: dashboard.holdings,
            holdings_source: dashboard.holdings_source,
            prices: dashboard.prices,
            prices_source: dashboard.prices_source,
            advice: dashboard.advice,
        }
    }
}

/// Form values as entered. Missing fields count as zero.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingsRequest {
    #[serde(default)]
    pub gold_weight: f64,
    #[serde(default)]
    pub savings_amount: f64,
    #[serde(default)]
    pub stablecoin_amount: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    /// Where the record ended up: live store, local cache, or nowhere
    pub saved: FetchStatus,
    pub dashboard: DashboardResponse,
}

#[derive(Debug, Serialize)]
pub struct AdviceResponse {
    pub advice: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, code: &str, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

fn advice_error_message(err: &PortfolioError) -> String {
    match err {
        PortfolioError::Llm(e) => e.user_message(),
        other => other.to_string(),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let llm_connected = match &state.provider {
        Some(provider) => Some(provider.health_check().await.unwrap_or(false)),
        None => None,
    };

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        price_source: state.oracle.name().to_string(),
        llm_connected,
        store: state.store.primary_name().to_string(),
        cache: state.store.cache_name().map(str::to_string),
        notifier_configured: state.notifier.is_configured(),
    })
}

/// Current holdings, prices and computed allocation
pub async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    Json(state.snapshot().await.into())
}

/// Reload holdings and prices, then return the dashboard
pub async fn refresh_dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    Json(state.reload().await.into())
}

/// Save new holdings and recompute
pub async fn put_holdings(
    State(state): State<AppState>,
    Json(payload): Json<HoldingsRequest>,
) -> Result<Json<SaveResponse>, ApiError> {
    let Some(_guard) = state.saving.try_begin() else {
        return Err(api_error(StatusCode::CONFLICT, "SAVE_IN_PROGRESS", "A save is already in progress"));
    };

    let submitted = AssetHoldings::from_inputs(payload.gold_weight, payload.savings_amount, payload.stablecoin_amount);
    let fetched = state.store.save(&submitted).await;
    let saved = fetched.status();

    let holdings = match fetched {
        Fetched::Live { value } | Fetched::Fallback { value, .. } => value,
        Fetched::Unavailable { reason } => {
            tracing::error!(reason = %reason, "Holdings not persisted, keeping them in memory only");
            submitted
        }
    };

    let Dashboard { prices, prices_source, .. } = state.snapshot().await;
    let status = zen_portfolio::compute_status(&holdings, &prices);

    let advice = match &state.advisor {
        Some(advisor) => match advisor.advise(&status).await {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!(error = %e, "Advice generation failed");
                Some(NO_ADVICE.to_string())
            }
        },
        None => None,
    };

    let dashboard = {
        let mut current = state.dashboard.write().await;
        *current = Dashboard {
            holdings,
            holdings_source: saved.clone(),
            prices,
            prices_source,
            advice,
        };
        current.clone()
    };

    Ok(Json(SaveResponse {
        saved,
        dashboard: dashboard.into(),
    }))
}

/// Rebalancing advice for the current allocation
pub async fn post_advice(State(state): State<AppState>) -> Result<Json<AdviceResponse>, ApiError> {
    let advisor = state.advisor.as_ref().ok_or_else(|| {
        api_error(StatusCode::SERVICE_UNAVAILABLE, "ADVICE_DISABLED", "Advice is not configured")
    })?;

    let status = state.snapshot().await.status();
    let advice = advisor.advise(&status).await.map_err(|e| {
        tracing::error!(error = %e, "Advice generation failed");
        api_error(StatusCode::BAD_GATEWAY, "ADVICE_ERROR", advice_error_message(&e))
    })?;

    state.dashboard.write().await.advice = Some(advice.clone());

    Ok(Json(AdviceResponse { advice }))
}

/// Push the status report to the notification channel
pub async fn post_notify(State(state): State<AppState>) -> Result<Json<Delivery>, ApiError> {
    let Some(_guard) = state.notifying.try_begin() else {
        return Err(api_error(StatusCode::CONFLICT, "NOTIFY_IN_PROGRESS", "A notification is already being sent"));
    };

    let status = state.snapshot().await.status();
    let delivery = state.notifier.notify(&status).await;

    if let Delivery::Failed { reason } = &delivery {
        tracing::error!(notifier = state.notifier.name(), reason = %reason, "Notification failed");
    }

    Ok(Json(delivery))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Method, Request},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use zen_connect::{TelegramConfig, TelegramNotifier};
    use zen_llm::{Completion, GenerationOptions, LlmError, LlmProvider, Message};
    use zen_portfolio::{
        HoldingsStore, MemoryHoldingsStore, RebalanceAdvisor, ResilientHoldingsStore, StaticPriceOracle,
    };

    struct CannedProvider(Option<&'static str>);

    #[async_trait]
    impl LlmProvider for CannedProvider {
        fn name(&self) -> &str {
            "canned"
        }

        async fn health_check(&self) -> zen_llm::Result<bool> {
            Ok(self.0.is_some())
        }

        async fn complete(&self, _: &[Message], _: &GenerationOptions) -> zen_llm::Result<Completion> {
            self.0
                .map(|text| Completion::text("canned", text))
                .ok_or_else(|| LlmError::RateLimited("quota exceeded".into()))
        }
    }

    struct Fixture {
        state: AppState,
        primary: Arc<MemoryHoldingsStore>,
    }

    fn fixture() -> Fixture {
        let primary = Arc::new(MemoryHoldingsStore::new());
        let state = AppState::new(
            Arc::new(ResilientHoldingsStore::new(primary.clone())),
            Arc::new(StaticPriceOracle::default()),
            Arc::new(TelegramNotifier::new(TelegramConfig::default())),
        );
        Fixture { state, primary }
    }

    fn with_llm(state: AppState, reply: Option<&'static str>) -> AppState {
        let provider: Arc<dyn LlmProvider> = Arc::new(CannedProvider(reply));
        let advisor = RebalanceAdvisor::new(provider.clone());
        state.with_advisor(provider, advisor)
    }

    async fn call(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let f = fixture();
        let (status, body) = call(crate::router(f.state), Method::GET, "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["priceSource"], "static");
        assert_eq!(body["llmConnected"], Value::Null);
        assert_eq!(body["store"], "memory");
        assert_eq!(body["notifierConfigured"], false);
    }

    #[tokio::test]
    async fn test_dashboard_starts_empty() {
        let f = fixture();
        f.state.reload().await;
        let (status, body) = call(crate::router(f.state), Method::GET, "/api/dashboard", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isEmpty"], true);
        assert_eq!(body["needsRebalancing"], false);
        assert_eq!(body["holdingsSource"]["source"], "live");
        assert_eq!(body["pricesSource"]["source"], "fallback");
        assert_eq!(body["status"]["totalValue"], 0.0);
        assert_eq!(body["plan"][0]["action"], "HOLD");
    }

    #[tokio::test]
    async fn test_refresh_picks_up_stored_holdings() {
        let f = fixture();
        f.primary
            .save(&AssetHoldings::from_inputs(5.0, 50_000_000.0, 1000.0))
            .await
            .unwrap();

        let (status, body) = call(crate::router(f.state), Method::POST, "/api/dashboard/refresh", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"]["totalValue"], 116_700_000.0);
        assert_eq!(body["needsRebalancing"], true);
        assert_eq!(body["status"]["assets"][1]["type"], "SAVINGS");
        assert_eq!(body["status"]["assets"][1]["isOutOfBalance"], true);
        assert_eq!(body["plan"][2]["action"], "BUY");
    }

    #[tokio::test]
    async fn test_put_holdings_clamps_and_persists() {
        let f = fixture();
        let app = crate::router(f.state.clone());

        let (status, body) = call(
            app,
            Method::PUT,
            "/api/holdings",
            Some(json!({"goldWeight": -3, "savingsAmount": 50000000, "stablecoinAmount": 1000})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["saved"]["source"], "live");
        assert_eq!(body["dashboard"]["holdings"]["goldWeight"], 0.0);
        assert_eq!(body["dashboard"]["holdings"]["savingsAmount"], 50_000_000.0);
        assert!(body["dashboard"].get("advice").is_none());

        let stored = f.primary.fetch_latest().await.unwrap().unwrap();
        assert_eq!(stored.stablecoin_amount, dec!(1000));
        assert!(!f.state.saving.is_busy());
    }

    #[tokio::test]
    async fn test_put_holdings_huge_amount_keeps_dashboard_working() {
        let f = fixture();

        let (status, body) = call(
            crate::router(f.state.clone()),
            Method::PUT,
            "/api/holdings",
            Some(json!({"goldWeight": 0, "savingsAmount": 0, "stablecoinAmount": 1e25})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["dashboard"]["status"]["assets"][2]["currentPercentage"], 100.0);

        let stored = f.primary.fetch_latest().await.unwrap().unwrap();
        assert_eq!(stored.stablecoin_amount, zen_portfolio::MAX_QUANTITY);

        let (status, body) = call(crate::router(f.state), Method::POST, "/api/dashboard/refresh", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["needsRebalancing"], true);
    }

    /// Moves the shared prices while advice is being generated
    struct RefreshingProvider(Arc<tokio::sync::RwLock<Dashboard>>);

    #[async_trait]
    impl LlmProvider for RefreshingProvider {
        fn name(&self) -> &str {
            "refreshing"
        }

        async fn health_check(&self) -> zen_llm::Result<bool> {
            Ok(true)
        }

        async fn complete(&self, _: &[Message], _: &GenerationOptions) -> zen_llm::Result<Completion> {
            self.0.write().await.prices = zen_portfolio::MarketPrices::new(dec!(90000000), dec!(26000));
            Ok(Completion::text("refreshing", "Sell some savings."))
        }
    }

    #[tokio::test]
    async fn test_put_holdings_advice_matches_returned_prices() {
        let f = fixture();
        let provider: Arc<dyn LlmProvider> = Arc::new(RefreshingProvider(f.state.dashboard.clone()));
        let advisor = RebalanceAdvisor::new(provider.clone());
        let state = f.state.with_advisor(provider, advisor);

        let (status, body) = call(
            crate::router(state.clone()),
            Method::PUT,
            "/api/holdings",
            Some(json!({"goldWeight": 5, "savingsAmount": 50000000, "stablecoinAmount": 1000})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["dashboard"]["advice"], "Sell some savings.");
        assert_eq!(body["dashboard"]["prices"]["goldPricePerUnit"], 82_500_000.0);
        assert_eq!(body["dashboard"]["status"]["totalValue"], 116_700_000.0);

        let current = state.snapshot().await;
        assert_eq!(current.prices.gold_price_per_unit, dec!(82500000));
    }

    #[tokio::test]
    async fn test_put_holdings_includes_advice() {
        let f = fixture();
        let app = crate::router(with_llm(f.state, Some("Buy more USDT.")));

        let (_, body) = call(
            app,
            Method::PUT,
            "/api/holdings",
            Some(json!({"goldWeight": 5, "savingsAmount": 50000000, "stablecoinAmount": 1000})),
        )
        .await;
        assert_eq!(body["dashboard"]["advice"], "Buy more USDT.");
    }

    #[tokio::test]
    async fn test_put_holdings_conflict_while_saving() {
        let f = fixture();
        let _busy = f.state.saving.try_begin().unwrap();

        let (status, body) = call(
            crate::router(f.state.clone()),
            Method::PUT,
            "/api/holdings",
            Some(json!({"goldWeight": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "SAVE_IN_PROGRESS");
    }

    #[tokio::test]
    async fn test_advice_disabled_without_llm() {
        let f = fixture();
        let (status, body) = call(crate::router(f.state), Method::POST, "/api/advice", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "ADVICE_DISABLED");
    }

    #[tokio::test]
    async fn test_advice_ok_and_error() {
        let f = fixture();
        let (status, body) = call(
            crate::router(with_llm(f.state, Some("Hold steady."))),
            Method::POST,
            "/api/advice",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["advice"], "Hold steady.");

        let f = fixture();
        let (status, body) =
            call(crate::router(with_llm(f.state, None)), Method::POST, "/api/advice", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "ADVICE_ERROR");
    }

    #[tokio::test]
    async fn test_notify_skipped_when_unconfigured() {
        let f = fixture();
        let (status, body) = call(crate::router(f.state), Method::POST, "/api/notify", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "skipped");
        assert_eq!(body["reason"], "TELEGRAM_BOT_TOKEN not set");
    }

    #[tokio::test]
    async fn test_notify_conflict() {
        let f = fixture();
        let _busy = f.state.notifying.try_begin().unwrap();
        let (status, body) = call(crate::router(f.state.clone()), Method::POST, "/api/notify", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "NOTIFY_IN_PROGRESS");
    }
}
