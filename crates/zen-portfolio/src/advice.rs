//! Rebalance Advisor
//!
//! Free-text rebalancing guidance for the current allocation, generated by an
//! LLM. Provider errors are returned to the caller, which decides what to show.

use std::sync::Arc;

use tracing::debug;
use zen_llm::{GenerationOptions, LlmProvider, Message};

use crate::engine::{REBALANCE_THRESHOLD, TARGET_PERCENTAGE};
use crate::error::Result;
use crate::model::PortfolioStatus;
use crate::report::{Locale, format_amount, format_percent, format_signed_percent};

/// Shown when the model answers with nothing
pub const NO_ADVICE: &str = "No advice available at this time.";

pub struct RebalanceAdvisor {
    provider: Arc<dyn LlmProvider>,
    options: GenerationOptions,
    locale: Locale,
}

impl RebalanceAdvisor {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            options: GenerationOptions::default(),
            locale: Locale::default(),
        }
    }

    #[must_use]
    pub const fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.options = self.options.with_model(model);
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Prompt describing the allocation and the rebalancing rule
    pub fn build_prompt(&self, status: &PortfolioStatus) -> String {
        let assets: Vec<String> = status
            .assets
            .iter()
            .map(|a| {
                format!(
                    "- {}: {}% (Current Value: {} VND, Deviation: {}%)",
                    a.asset,
                    format_percent(a.current_percentage),
                    format_amount(a.current_value, self.locale),
                    format_signed_percent(a.deviation),
                )
            })
            .collect();

        format!(
            "Analyze this investment portfolio:\n\
             Total Value: {total} VND\n\
             {assets}\n\n\
             Target: {target}% each. Balance threshold: +/- {threshold}%.\n\
             Identify which assets need to be bought or sold to return to an equal 1/3 split.\n\
             Keep the advice concise and actionable for a professional investor in Vietnam.\n\
             {answer_in}",
            total = format_amount(status.total_value, self.locale),
            assets = assets.join("\n"),
            target = TARGET_PERCENTAGE,
            threshold = REBALANCE_THRESHOLD,
            answer_in = self.locale.answer_instruction(),
        )
    }

    /// Ask the model for advice. Empty answers become `NO_ADVICE`.
    pub async fn advise(&self, status: &PortfolioStatus) -> Result<String> {
        let prompt = self.build_prompt(status);
        let completion = self
            .provider
            .complete(&[Message::user(prompt)], &self.options)
            .await?;

        let text = completion.content.trim();
        debug!(model = %completion.model, chars = text.len(), "Generated advice");

        if text.is_empty() {
            Ok(NO_ADVICE.to_string())
        } else {
            Ok(text.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::compute_status;
    use crate::error::PortfolioError;
    use crate::model::{AssetHoldings, MarketPrices};
    use crate::testing::ScriptedProvider;
    use rust_decimal_macros::dec;
    use zen_llm::LlmError;

    fn status() -> PortfolioStatus {
        compute_status(
            &AssetHoldings::new(dec!(5), dec!(50000000), dec!(1000)),
            &MarketPrices::new(dec!(82500000), dec!(25450)),
        )
    }

    #[test]
    fn test_prompt_contents() {
        let advisor = RebalanceAdvisor::new(Arc::new(ScriptedProvider::new([])));
        let prompt = advisor.build_prompt(&status());

        assert!(prompt.contains("Total Value: 116.700.000 VND"));
        assert!(prompt.contains("- GOLD: 35.35% (Current Value: 41.250.000 VND, Deviation: +2.02%)"));
        assert!(prompt.contains("- SAVINGS: 42.84%"));
        assert!(prompt.contains("- STABLECOIN: 21.81%"));
        assert!(prompt.contains("Target: 33.33% each. Balance threshold: +/- 5%."));
        assert!(prompt.ends_with("tiếng Việt."));

        let english = RebalanceAdvisor::new(Arc::new(ScriptedProvider::new([]))).with_locale(Locale::En);
        let prompt = english.build_prompt(&status());
        assert!(prompt.contains("Total Value: 116,700,000 VND"));
        assert!(prompt.ends_with("Answer in English."));
    }

    #[tokio::test]
    async fn test_advise_returns_model_text() {
        let provider = Arc::new(ScriptedProvider::replying("  Sell savings, buy USDT.\n"));
        let advisor = RebalanceAdvisor::new(provider.clone()).with_model("gemini-test");

        let advice = advisor.advise(&status()).await.unwrap();
        assert_eq!(advice, "Sell savings, buy USDT.");

        let (messages, options) = provider.last_request().unwrap();
        assert!(messages[0].content.starts_with("Analyze this investment portfolio"));
        assert_eq!(options.model.as_deref(), Some("gemini-test"));
        assert!(!options.web_search);
    }

    #[tokio::test]
    async fn test_empty_answer_becomes_placeholder() {
        let advisor = RebalanceAdvisor::new(Arc::new(ScriptedProvider::replying("   ")));
        assert_eq!(advisor.advise(&status()).await.unwrap(), NO_ADVICE);
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let advisor = RebalanceAdvisor::new(Arc::new(ScriptedProvider::failing(LlmError::Auth(
            "invalid key".into(),
        ))));
        let err = advisor.advise(&status()).await.unwrap_err();
        assert!(matches!(err, PortfolioError::Llm(LlmError::Auth(_))));
    }
}
