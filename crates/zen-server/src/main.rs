//! ZenWealth HTTP Server
//!
//! Axum service that owns the current holdings/prices pair and exposes the
//! portfolio dashboard, holdings updates, advice and chat reports as JSON.

mod config;
mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zen_connect::{LocalCacheStore, SupabaseHoldingsStore, TelegramNotifier};
use zen_gemini::GeminiProvider;
use zen_llm::LlmProvider;
use zen_portfolio::{PriceOracle, RebalanceAdvisor, ResilientHoldingsStore, SearchPriceOracle, StaticPriceOracle};

use crate::config::ServerConfig;
use crate::handlers::{
    get_dashboard, health_check, post_advice, post_notify, put_holdings, refresh_dashboard,
};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();
    let config = ServerConfig::from_env();

    // LLM provider: live prices and advice
    let provider: Option<Arc<dyn LlmProvider>> = match GeminiProvider::from_env() {
        Ok(gemini) => {
            tracing::info!(model = %gemini.config().model, "✓ Gemini configured");
            Some(Arc::new(gemini))
        }
        Err(e) => {
            tracing::warn!("⚠ {e} - using static prices, advice disabled");
            None
        }
    };

    let oracle: Arc<dyn PriceOracle> = match &provider {
        Some(provider) => Arc::new(SearchPriceOracle::new(provider.clone())),
        None => Arc::new(StaticPriceOracle::default()),
    };

    // Holdings store: Supabase with local cache, or the cache alone
    let cache = Arc::new(LocalCacheStore::new(&config.cache_path));
    let store = match SupabaseHoldingsStore::from_env() {
        Ok(supabase) => {
            tracing::info!(table = %supabase.config().table, "✓ Supabase configured");
            ResilientHoldingsStore::new(Arc::new(supabase)).with_cache(cache)
        }
        Err(e) => {
            tracing::warn!("⚠ {e} - holdings kept in {}", config.cache_path.display());
            ResilientHoldingsStore::new(cache)
        }
    };

    let notifier = TelegramNotifier::from_env().with_locale(config.locale);
    if let Some(missing) = notifier.config().missing() {
        tracing::warn!("⚠ {missing} - chat reports disabled");
    }

    // Build application state
    let mut state = AppState::new(Arc::new(store), oracle, Arc::new(notifier));
    if let Some(provider) = provider {
        let advisor = RebalanceAdvisor::new(provider.clone()).with_locale(config.locale);
        state = state.with_advisor(provider, advisor);
    }

    // Initial load: store and oracle concurrently
    state.reload().await;

    let app = router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 ZenWealth server running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                 - Health check");
    tracing::info!("  GET  /api/dashboard          - Holdings, prices, allocation");
    tracing::info!("  POST /api/dashboard/refresh  - Reload holdings and prices");
    tracing::info!("  PUT  /api/holdings           - Save holdings");
    tracing::info!("  POST /api/advice             - Rebalancing advice");
    tracing::info!("  POST /api/notify             - Send chat report");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the HTTP router over `state`
pub fn router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & info
        .route("/health", get(health_check))

        // Dashboard
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/dashboard/refresh", post(refresh_dashboard))

        // Actions
        .route("/api/holdings", put(put_holdings))
        .route("/api/advice", post(post_advice))
        .route("/api/notify", post(post_notify))

        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
