//! Notification Sinks
//!
//! Delivery of the rendered status report to a chat channel. Delivery is
//! fire-and-forget: failures are reported back, never raised.

use async_trait::async_trait;
use serde::Serialize;

use crate::model::PortfolioStatus;

/// Outcome of one notification attempt
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Delivery {
    /// Accepted by the channel
    Sent,

    /// Not attempted, e.g. missing credentials
    Skipped { reason: String },

    /// Attempted and rejected or unreachable. Not retried.
    Failed { reason: String },
}

impl Delivery {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped { reason: reason.into() }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed { reason: reason.into() }
    }

    pub const fn is_sent(&self) -> bool {
        matches!(self, Self::Sent)
    }
}

/// Notification channel (Strategy pattern)
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name for logs and health output
    fn name(&self) -> &str;

    /// Whether credentials are present; an unconfigured notifier skips
    fn is_configured(&self) -> bool;

    /// Render and deliver a report for `status`
    async fn notify(&self, status: &PortfolioStatus) -> Delivery;
}
