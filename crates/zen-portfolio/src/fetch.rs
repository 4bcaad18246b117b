//! Fetch Outcomes
//!
//! Reads and writes against external collaborators can succeed, degrade to a
//! fallback copy, or come back empty-handed. `Fetched` keeps those three
//! cases apart so callers can tell real data from degraded data.

use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Fetched<T> {
    /// Real data from the primary source
    Live { value: T },

    /// Degraded data: local cache, last known good or a hardcoded default
    Fallback { value: T, reason: String },

    /// Nothing available
    Unavailable { reason: String },
}

/// Where a value came from, without the value itself
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FetchStatus {
    pub source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl<T> Fetched<T> {
    pub const fn live(value: T) -> Self {
        Self::Live { value }
    }

    pub fn fallback(value: T, reason: impl Into<String>) -> Self {
        Self::Fallback { value, reason: reason.into() }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable { reason: reason.into() }
    }

    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Live { value } | Self::Fallback { value, .. } => Some(value),
            Self::Unavailable { .. } => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Live { value } | Self::Fallback { value, .. } => Some(value),
            Self::Unavailable { .. } => None,
        }
    }

    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Live { .. })
    }

    /// Anything other than live data
    pub const fn is_degraded(&self) -> bool {
        !self.is_live()
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Live { .. } => None,
            Self::Fallback { reason, .. } | Self::Unavailable { reason } => Some(reason),
        }
    }

    pub const fn source(&self) -> &'static str {
        match self {
            Self::Live { .. } => "live",
            Self::Fallback { .. } => "fallback",
            Self::Unavailable { .. } => "unavailable",
        }
    }

    pub fn status(&self) -> FetchStatus {
        FetchStatus {
            source: self.source(),
            reason: self.reason().map(str::to_string),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Self::Live { value } => Fetched::Live { value: f(value) },
            Self::Fallback { value, reason } => Fetched::Fallback { value: f(value), reason },
            Self::Unavailable { reason } => Fetched::Unavailable { reason },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let live = Fetched::live(3);
        assert_eq!(live.value(), Some(&3));
        assert!(live.is_live());
        assert!(live.reason().is_none());

        let degraded = Fetched::fallback(4, "cache");
        assert!(degraded.is_degraded());
        assert_eq!(degraded.reason(), Some("cache"));
        assert_eq!(degraded.map(|v| v * 2).into_value(), Some(8));

        let none: Fetched<i32> = Fetched::unavailable("down");
        assert!(none.value().is_none());
        assert_eq!(none.source(), "unavailable");
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(Fetched::fallback(1, "store down")).unwrap();
        assert_eq!(json["source"], "fallback");
        assert_eq!(json["value"], 1);
        assert_eq!(json["reason"], "store down");

        let status = serde_json::to_value(Fetched::live("x").status()).unwrap();
        assert_eq!(status, serde_json::json!({"source": "live"}));
    }
}
