//! Cache entry layout and expiry policy.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Provider label recorded with a negative entry.
pub const EXHAUSTED_LABEL: &str = "exhausted";

/// Last known resolution outcome for one domain.
///
/// The domain itself is the key of the persisted map, so it is not repeated
/// here. `ok == false` always comes with an empty `src`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CacheEntry {
    /// Resolved icon address; empty for a negative outcome.
    pub src: String,
    /// Write time, milliseconds since the Unix epoch.
    pub at: i64,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl CacheEntry {
    pub fn success(src: impl Into<String>, at: i64, provider: impl Into<String>) -> Self {
        Self { src: src.into(), at, ok: true, provider: Some(provider.into()) }
    }

    pub fn failure(at: i64, provider: impl Into<String>) -> Self {
        Self { src: String::new(), at, ok: false, provider: Some(provider.into()) }
    }

    /// Whether the entry is older than its TTL at `now_ms`.
    pub fn is_expired(&self, now_ms: i64, policy: &CachePolicy) -> bool {
        now_ms.saturating_sub(self.at) > policy.ttl_ms(self.ok)
    }
}

/// Expiry and capacity policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub success_ttl: Duration,
    pub failure_ttl: Duration,
    pub max_entries: usize,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            success_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            failure_ttl: Duration::from_secs(10 * 60),
            max_entries: 500,
        }
    }
}

impl CachePolicy {
    /// TTL in milliseconds for an entry with the given outcome.
    pub fn ttl_ms(&self, ok: bool) -> i64 {
        let ttl = if ok { self.success_ttl } else { self.failure_ttl };
        i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_has_empty_src() {
        let entry = CacheEntry::failure(1_000, EXHAUSTED_LABEL);
        assert!(!entry.ok);
        assert!(entry.src.is_empty());
        assert_eq!(entry.provider.as_deref(), Some("exhausted"));
    }

    #[test]
    fn test_expiry_boundary() {
        let policy = CachePolicy::default();
        let ttl = policy.ttl_ms(true);
        let entry = CacheEntry::success("https://example.com/favicon.ico", 0, "direct");
        assert!(!entry.is_expired(ttl, &policy));
        assert!(entry.is_expired(ttl + 1, &policy));
    }

    #[test]
    fn test_ttl_asymmetry() {
        let policy = CachePolicy::default();
        assert!(policy.ttl_ms(false) < policy.ttl_ms(true));

        let written_at = 50_000;
        let ok = CacheEntry::success("https://example.com/favicon.ico", written_at, "direct");
        let failed = CacheEntry::failure(written_at, EXHAUSTED_LABEL);
        let later = written_at + policy.ttl_ms(false) + 1;
        assert!(failed.is_expired(later, &policy));
        assert!(!ok.is_expired(later, &policy));
    }

    #[test]
    fn test_json_layout() {
        let entry = CacheEntry::success("https://example.com/favicon.ico", 42, "direct");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"src": "https://example.com/favicon.ico", "at": 42, "ok": true, "provider": "direct"})
        );

        let bare: CacheEntry = serde_json::from_str(r#"{"src":"","at":7,"ok":false}"#).unwrap();
        assert_eq!(bare.provider, None);
    }
}
