//! cache_purge tool implementation.
//!
//! Purges cache entries by age, domain, or count.

use favicache_core::{Error, FaviconResolver, KeyValueStore};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Drop entries whose TTL has elapsed.
    pub expired: Option<bool>,

    /// Drop the entry for this URL's domain.
    pub url: Option<String>,

    /// Keep only the newest N entries.
    pub max_entries: Option<usize>,

    /// Drop every entry.
    pub all: Option<bool>,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Number of entries deleted.
    pub deleted: usize,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl<S: KeyValueStore>(
    resolver: &Mutex<FaviconResolver<S>>, params: CachePurgeParams,
) -> Result<CallToolResult, McpError> {
    let expired = params.expired.unwrap_or(false);
    let all = params.all.unwrap_or(false);

    if !expired && !all && params.url.is_none() && params.max_entries.is_none() {
        return Err(Error::InvalidInput(
            "At least one of expired, url, max_entries, or all must be specified".to_string(),
        )
        .into());
    }

    let mut r = resolver.lock().await;
    let cache = r.cache();
    let mut deleted = 0usize;

    if all {
        deleted += cache.clear();
    } else {
        if expired {
            deleted += cache.purge_expired();
        }

        if let Some(url) = params.url.as_deref()
            && cache.forget(Some(url))
        {
            deleted += 1;
        }

        if let Some(max_entries) = params.max_entries {
            deleted += cache.purge_to(max_entries);
        }
    }
    drop(r);

    tracing::info!(deleted, "purged favicon cache");

    let output = CachePurgeOutput { deleted };
    let json = serde_json::to_string_pretty(&output).map_err(Error::from)?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
