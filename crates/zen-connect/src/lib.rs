//! # zen-connect
//!
//! Adapters between the portfolio contracts and the outside world.
//!
//! ```text
//! ┌──────────────────────┐   HoldingsStore   ┌─────────────────────────┐
//! │ SupabaseHoldingsStore│◄──────────────────│                         │
//! │   (PostgREST rows)   │                   │                         │
//! ├──────────────────────┤   HoldingsStore   │      zen-portfolio      │
//! │   LocalCacheStore    │◄──────────────────│ ResilientHoldingsStore  │
//! │  (one JSON document) │                   │                         │
//! ├──────────────────────┤     Notifier      │                         │
//! │   TelegramNotifier   │◄──────────────────│  render_report(status)  │
//! └──────────────────────┘                   └─────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use zen_connect::{LocalCacheStore, SupabaseHoldingsStore, TelegramNotifier};
//! use zen_portfolio::ResilientHoldingsStore;
//!
//! let store = ResilientHoldingsStore::new(Arc::new(SupabaseHoldingsStore::from_env()?))
//!     .with_cache(Arc::new(LocalCacheStore::new(".zenwealth/holdings.json")));
//! let notifier = TelegramNotifier::from_env();
//! ```

mod cache;
mod error;
mod supabase;
mod telegram;

pub use cache::{DEFAULT_CACHE_PATH, LocalCacheStore};
pub use error::{ConnectError, Result};
pub use supabase::{DEFAULT_TABLE, SupabaseConfig, SupabaseHoldingsStore};
pub use telegram::{DEFAULT_API_BASE, TelegramConfig, TelegramNotifier};
