//! Telegram Notifier
//!
//! Pushes the rendered portfolio report to a chat through the Bot API.
//! Missing credentials skip the delivery; failures are logged and reported,
//! never retried.

use async_trait::async_trait;
use chrono::Local;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use zen_portfolio::{Delivery, Locale, Notifier, PortfolioStatus, render_report};

/// Public Bot API endpoint
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Token value shipped in sample env files
const PLACEHOLDER_TOKEN: &str = "your-bot-token";

/// Telegram settings. Both fields are optional; an incomplete config makes
/// every delivery a skip.
#[derive(Clone, Debug)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    pub api_base: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base: DEFAULT_API_BASE.into(),
        }
    }
}

impl TelegramConfig {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: Some(bot_token.into()),
            chat_id: Some(chat_id.into()),
            ..Self::default()
        }
    }

    /// Read `TELEGRAM_BOT_TOKEN`, `TELEGRAM_CHAT_ID` and `TELEGRAM_API_BASE`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v: &String| !v.trim().is_empty());

        Self {
            bot_token: non_empty("TELEGRAM_BOT_TOKEN"),
            chat_id: non_empty("TELEGRAM_CHAT_ID"),
            api_base: non_empty("TELEGRAM_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.into())
                .trim_end_matches('/')
                .to_string(),
        }
    }

    /// Why this config cannot send, if it cannot
    pub fn missing(&self) -> Option<&'static str> {
        match (self.bot_token.as_deref(), self.chat_id.as_deref()) {
            (None, _) => Some("TELEGRAM_BOT_TOKEN not set"),
            (Some(PLACEHOLDER_TOKEN), _) => Some("TELEGRAM_BOT_TOKEN is a placeholder"),
            (_, None) => Some("TELEGRAM_CHAT_ID not set"),
            _ => None,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.missing().is_none()
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

#[derive(Deserialize)]
struct BotReply {
    ok: bool,
    description: Option<String>,
}

/// `Notifier` over the Telegram Bot API
pub struct TelegramNotifier {
    client: Client,
    config: TelegramConfig,
    locale: Locale,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            locale: Locale::default(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(TelegramConfig::from_env())
    }

    #[must_use]
    pub const fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub const fn config(&self) -> &TelegramConfig {
        &self.config
    }

    /// Send `text` as a Markdown message to the configured chat
    pub async fn send_message(&self, text: &str) -> Delivery {
        let (Some(token), Some(chat_id)) = (self.config.bot_token.as_deref(), self.config.chat_id.as_deref())
        else {
            return self.skip();
        };
        if token == PLACEHOLDER_TOKEN {
            return self.skip();
        }

        let url = format!("{}/bot{token}/sendMessage", self.config.api_base);
        let payload = SendMessage {
            chat_id,
            text,
            parse_mode: "Markdown",
        };

        let response = match self.client.post(&url).json(&payload).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Failed to send Telegram notification");
                return Delivery::failed(format!("request failed: {e}"));
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let reply = serde_json::from_str::<BotReply>(&body).ok();

        match reply {
            Some(BotReply { ok: true, .. }) if status.is_success() => {
                debug!("Telegram notification sent successfully");
                Delivery::Sent
            }
            _ => {
                let detail = reply.and_then(|r| r.description).unwrap_or(body);
                warn!(status = %status, body = %detail, "Telegram API returned error");
                Delivery::failed(format!("Telegram API returned {status}: {detail}"))
            }
        }
    }

    fn skip(&self) -> Delivery {
        let reason = self.config.missing().unwrap_or("Telegram is not configured");
        warn!(reason, "Skipping Telegram notification");
        Delivery::skipped(reason)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn notify(&self, status: &PortfolioStatus) -> Delivery {
        let report = render_report(status, self.locale, Local::now().date_naive());
        self.send_message(&report).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};
    use zen_portfolio::{AssetHoldings, MarketPrices, compute_status};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn notifier(api_base: String) -> TelegramNotifier {
        TelegramNotifier::new(TelegramConfig {
            api_base,
            ..TelegramConfig::new("test-token", "42")
        })
    }

    fn status() -> PortfolioStatus {
        compute_status(
            &AssetHoldings::new(dec!(5), dec!(50000000), dec!(1000)),
            &MarketPrices::new(dec!(82500000), dec!(25450)),
        )
    }

    #[test]
    fn test_config_from_lookup() {
        let config = TelegramConfig::from_lookup(|key| match key {
            "TELEGRAM_BOT_TOKEN" => Some("test-token".into()),
            "TELEGRAM_CHAT_ID" => Some("42".into()),
            "TELEGRAM_API_BASE" => Some("http://localhost:8081/".into()),
            _ => None,
        });
        assert!(config.is_configured());
        assert_eq!(config.api_base, "http://localhost:8081");

        let empty = TelegramConfig::from_lookup(|_| None);
        assert_eq!(empty.api_base, DEFAULT_API_BASE);
        assert_eq!(empty.missing(), Some("TELEGRAM_BOT_TOKEN not set"));
    }

    #[test]
    fn test_config_rejects_placeholder_and_missing_chat() {
        assert_eq!(
            TelegramConfig::new(PLACEHOLDER_TOKEN, "42").missing(),
            Some("TELEGRAM_BOT_TOKEN is a placeholder")
        );
        let no_chat = TelegramConfig {
            chat_id: None,
            ..TelegramConfig::new("test-token", "42")
        };
        assert_eq!(no_chat.missing(), Some("TELEGRAM_CHAT_ID not set"));
    }

    #[tokio::test]
    async fn test_unconfigured_skips() {
        let notifier = TelegramNotifier::new(TelegramConfig::default());
        assert!(!notifier.is_configured());
        assert!(matches!(notifier.notify(&status()).await, Delivery::Skipped { .. }));

        let placeholder = TelegramNotifier::new(TelegramConfig::new(PLACEHOLDER_TOKEN, "42"));
        assert!(matches!(placeholder.send_message("hi").await, Delivery::Skipped { .. }));
    }

    #[tokio::test]
    async fn test_sends_markdown_report() {
        let received: Arc<Mutex<Option<Value>>> = Arc::default();
        let router = Router::new()
            .route(
                "/bottest-token/sendMessage",
                post(|State(slot): State<Arc<Mutex<Option<Value>>>>, Json(body): Json<Value>| async move {
                    *slot.lock().unwrap() = Some(body);
                    Json(json!({"ok": true, "result": {"message_id": 1}}))
                }),
            )
            .with_state(received.clone());
        let notifier = notifier(serve(router).await);

        let delivery = notifier.notify(&status()).await;
        assert_eq!(delivery, Delivery::Sent);

        let body = received.lock().unwrap().clone().unwrap();
        assert_eq!(body["chat_id"], "42");
        assert_eq!(body["parse_mode"], "Markdown");
        let text = body["text"].as_str().unwrap();
        assert!(text.contains("116.700.000 VND"));
        assert!(text.contains("Cần cân bằng lại danh mục!"));
    }

    #[tokio::test]
    async fn test_api_error_is_failed() {
        let router = Router::new().route(
            "/bottest-token/sendMessage",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"ok": false, "description": "Bad Request: chat not found"})),
                )
            }),
        );
        let notifier = notifier(serve(router).await);

        match notifier.send_message("hi").await {
            Delivery::Failed { reason } => assert!(reason.contains("chat not found")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ok_false_is_failed() {
        let router = Router::new().route(
            "/bottest-token/sendMessage",
            post(|| async { Json(json!({"ok": false, "description": "flood"})) }),
        );
        let notifier = notifier(serve(router).await);
        assert!(matches!(notifier.send_message("hi").await, Delivery::Failed { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_is_failed() {
        let notifier = notifier("http://127.0.0.1:1".into());
        assert!(matches!(notifier.send_message("hi").await, Delivery::Failed { .. }));
    }
}
