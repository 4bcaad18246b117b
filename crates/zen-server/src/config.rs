//! Server Configuration

use std::path::PathBuf;

use zen_connect::DEFAULT_CACHE_PATH;
use zen_portfolio::Locale;

/// Address used when `BIND_ADDR` is not set
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Settings owned by the server itself. Client credentials (Gemini,
/// Supabase, Telegram) are read by each client's own config.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub cache_path: PathBuf,
    pub locale: Locale,
}

impl ServerConfig {
    /// Read `BIND_ADDR`, `HOLDINGS_CACHE_PATH` and `REPORT_LOCALE`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v: &String| !v.trim().is_empty());

        let locale = match non_empty("REPORT_LOCALE").map(|raw| raw.parse::<Locale>()) {
            Some(Ok(locale)) => locale,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Invalid REPORT_LOCALE, using default");
                Locale::default()
            }
            None => Locale::default(),
        };

        Self {
            bind_addr: non_empty("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            cache_path: non_empty("HOLDINGS_CACHE_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_CACHE_PATH), PathBuf::from),
            locale,
        }
    }
}
