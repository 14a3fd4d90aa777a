//! cache_get tool implementation.
//!
//! Retrieves the raw cache entry for a URL's domain, expired or not.

use favicache_core::{CacheEntry, Error, FaviconResolver, KeyValueStore, domain::normalize_domain};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Any URL on the domain to look up.
    pub url: String,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub domain: String,
    pub entry: CacheEntry,
    /// Whether the entry is still within its TTL.
    pub live: bool,
}

/// Implementation of the cache_get tool.
pub async fn get_impl<S: KeyValueStore>(
    resolver: &Mutex<FaviconResolver<S>>, params: CacheGetParams,
) -> Result<CallToolResult, McpError> {
    let domain = normalize_domain(&params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;

    let mut r = resolver.lock().await;
    let cache = r.cache();
    let entry = cache
        .entry(Some(params.url.as_str()))
        .ok_or_else(|| Error::CacheMiss(domain.clone()))?;
    let live = cache.is_live(&entry);
    drop(r);

    let output = CacheGetOutput { domain, entry, live };
    let json = serde_json::to_string_pretty(&output).map_err(Error::from)?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use favicache_core::{CachePolicy, CandidateGenerator, FaviconCache, MemoryStore, ProviderMode};

    fn resolver() -> Mutex<FaviconResolver<MemoryStore>> {
        let cache = FaviconCache::new(MemoryStore::new(), "t:favicon-cache:v1", CachePolicy::default());
        Mutex::new(FaviconResolver::new(cache, CandidateGenerator::new(ProviderMode::Chain)))
    }

    #[tokio::test]
    async fn test_get_impl_missing() {
        let resolver = resolver();
        let params = CacheGetParams { url: "https://example.com".to_string() };

        let err = get_impl(&resolver, params).await.unwrap_err();
        assert_eq!(err.code.0, -32001);
    }

    #[tokio::test]
    async fn test_get_impl_invalid_url() {
        let resolver = resolver();
        let params = CacheGetParams { url: "chrome://settings".to_string() };

        let err = get_impl(&resolver, params).await.unwrap_err();
        assert_eq!(err.code.0, -32003);
    }

    #[tokio::test]
    async fn test_get_impl_found() {
        let resolver = resolver();
        resolver.lock().await.cache().remember(
            Some("https://example.com"),
            "https://example.com/favicon.ico",
            "direct",
        );

        let params = CacheGetParams { url: "https://www.example.com/x".to_string() };
        let result = get_impl(&resolver, params).await.unwrap();
        let content_val = serde_json::to_value(&result.content[0]).unwrap();
        let text = content_val
            .get("text")
            .and_then(|v| v.as_str())
            .expect("Expected text field in content");
        let output: CacheGetOutput = serde_json::from_str(text).unwrap();
        assert_eq!(output.domain, "example.com");
        assert!(output.entry.ok);
        assert!(output.live);
    }
}
