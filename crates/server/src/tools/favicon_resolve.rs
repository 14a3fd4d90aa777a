//! favicon_resolve tool implementation.
//!
//! Serves a cached icon when one is known; otherwise probes candidates over
//! the network until one loads, recording the outcome.

use favicache_client::{ProbeOptions, resolve_link};
use favicache_core::{Error, KeyValueStore};
use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Input parameters for favicon_resolve tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FaviconResolveParams {
    /// The page URL whose icon should be resolved.
    pub url: String,

    /// Ignore any cached outcome (positive or negative) and probe again.
    #[serde(default)]
    pub force_refresh: bool,
}

/// Implementation of the favicon_resolve tool.
pub async fn resolve_impl<S: KeyValueStore>(
    state: &AppState<S>, params: FaviconResolveParams,
) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }

    let link = state.link_for(&params.url);
    let options = ProbeOptions { force_refresh: params.force_refresh };
    let outcome = resolve_link(&state.resolver, state.loader.as_ref(), &link, options).await;

    let json = serde_json::to_string_pretty(&outcome).map_err(Error::from)?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use async_trait::async_trait;
    use favicache_client::{IconLoader, LoadError, LoadedIcon};
    use favicache_core::{CachePolicy, CandidateGenerator, FaviconCache, FaviconResolver, MemoryStore, ProviderMode};

    /// Loader for which every address fails.
    struct DeadLoader;

    #[async_trait]
    impl IconLoader for DeadLoader {
        async fn load(&self, _src: &str) -> Result<LoadedIcon, LoadError> {
            Err(LoadError::Http("status 404".into()))
        }
    }

    fn state() -> AppState<MemoryStore> {
        let cache = FaviconCache::new(MemoryStore::new(), "t:favicon-cache:v1", CachePolicy::default());
        let resolver = FaviconResolver::new(cache, CandidateGenerator::new(ProviderMode::Direct));
        AppState::new(resolver, Arc::new(DeadLoader))
    }

    fn text(result: &CallToolResult) -> serde_json::Value {
        let content_val = serde_json::to_value(&result.content[0]).unwrap();
        let text = content_val
            .get("text")
            .and_then(|v| v.as_str())
            .expect("Expected text field in content");
        serde_json::from_str(text).unwrap()
    }

    #[tokio::test]
    async fn test_resolve_empty_url() {
        let state = state();
        let params = FaviconResolveParams { url: "  ".into(), force_refresh: false };
        assert!(resolve_impl(&state, params).await.is_err());
    }

    #[tokio::test]
    async fn test_resolve_exhausted() {
        let state = state();
        let params = FaviconResolveParams { url: "https://dead.example".into(), force_refresh: false };

        let output = text(&resolve_impl(&state, params.clone()).await.unwrap());
        assert_eq!(output["exhausted"], true);
        assert_eq!(output["attempts"], 2);
        assert_eq!(output["domain"], "dead.example");

        let again = text(&resolve_impl(&state, params).await.unwrap());
        assert_eq!(again["cached"], true);
        assert_eq!(again["attempts"], 0);
    }

    #[tokio::test]
    async fn test_resolve_cached_hit() {
        let state = state();
        state.resolver.lock().await.cache().remember(
            Some("https://example.com"),
            "https://example.com/favicon.ico",
            "direct",
        );

        let params = FaviconResolveParams { url: "https://www.example.com/docs".into(), force_refresh: false };
        let output = text(&resolve_impl(&state, params).await.unwrap());
        assert_eq!(output["cached"], true);
        assert_eq!(output["src"], "https://example.com/favicon.ico");
        assert_eq!(output["provider"], "direct");
    }
}
