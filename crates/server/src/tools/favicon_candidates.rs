//! favicon_candidates tool implementation.
//!
//! Lists the addresses that would be tried for a URL, in order. No network
//! requests are made and the cache is not consulted.

use favicache_core::{Candidate, Error, FaviconResolver, KeyValueStore, ProviderMode, domain::domain_of};
use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Input parameters for favicon_candidates tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FaviconCandidatesParams {
    /// The page URL whose icon candidates should be listed.
    pub url: String,
}

/// Output structure for favicon_candidates tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FaviconCandidatesOutput {
    /// Normalized domain, absent when the URL has none.
    pub domain: Option<String>,
    /// Active provider mode.
    pub mode: ProviderMode,
    /// Candidates in the order they are tried.
    pub candidates: Vec<Candidate>,
}

/// Implementation of the favicon_candidates tool.
pub async fn candidates_impl<S: KeyValueStore>(
    resolver: &Mutex<FaviconResolver<S>>, params: FaviconCandidatesParams,
) -> Result<CallToolResult, McpError> {
    let generator = *resolver.lock().await.generator();
    let url = Some(params.url.as_str());

    let output = FaviconCandidatesOutput {
        domain: domain_of(url),
        mode: generator.mode(),
        candidates: generator.candidate_list(url),
    };
    let json = serde_json::to_string_pretty(&output).map_err(Error::from)?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use favicache_core::{CachePolicy, CandidateGenerator, FaviconCache, MemoryStore, PLACEHOLDER, Provider};

    fn resolver(mode: ProviderMode) -> Mutex<FaviconResolver<MemoryStore>> {
        let cache = FaviconCache::new(MemoryStore::new(), "t:favicon-cache:v1", CachePolicy::default());
        Mutex::new(FaviconResolver::new(cache, CandidateGenerator::new(mode)))
    }

    fn parse(result: &CallToolResult) -> FaviconCandidatesOutput {
        let content_val = serde_json::to_value(&result.content[0]).unwrap();
        let text = content_val
            .get("text")
            .and_then(|v| v.as_str())
            .expect("Expected text field in content");
        serde_json::from_str(text).unwrap()
    }

    #[tokio::test]
    async fn test_candidates_chain() {
        let resolver = resolver(ProviderMode::Chain);
        let params = FaviconCandidatesParams { url: "https://www.example.com/path".into() };

        let output = parse(&candidates_impl(&resolver, params).await.unwrap());
        assert_eq!(output.domain.as_deref(), Some("example.com"));
        assert_eq!(output.mode, ProviderMode::Chain);
        assert_eq!(output.candidates.len(), 5);
        assert_eq!(output.candidates[0].provider, Provider::Direct);
        assert_eq!(output.candidates[4].provider, Provider::Raycast);
    }

    #[tokio::test]
    async fn test_candidates_malformed_url() {
        let resolver = resolver(ProviderMode::Google);
        let params = FaviconCandidatesParams { url: "::not a url::".into() };

        let output = parse(&candidates_impl(&resolver, params).await.unwrap());
        assert_eq!(output.domain, None);
        assert_eq!(output.candidates.len(), 1);
        assert_eq!(output.candidates[0].src, PLACEHOLDER);
    }
}
