//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::state::AppState;
use crate::tools::cache::{CacheGetParams, CachePurgeParams, get_impl, purge_impl};
use crate::tools::{FaviconCandidatesParams, FaviconResolveParams, candidates_impl, resolve_impl};

use favicache_core::SqliteStore;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for mcp-favicon.
#[derive(Clone)]
pub struct FaviconServer {
    state: Arc<AppState<SqliteStore>>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl FaviconServer {
    /// Create a new server handler over shared state.
    pub fn new(state: Arc<AppState<SqliteStore>>) -> Self {
        Self { state, tool_router: Self::tool_router() }
    }

    /// List icon candidates for a URL.
    ///
    /// No network requests are made.
    #[tool(description = "List the favicon addresses that would be tried for a URL, in order. No network requests.")]
    async fn favicon_candidates(&self, params: Parameters<FaviconCandidatesParams>) -> Result<CallToolResult, McpError> {
        candidates_impl(&self.state.resolver, params.0).await
    }

    /// Resolve a working icon for a URL, probing candidates as needed.
    #[tool(
        description = "Resolve a working favicon for a URL. Uses the cache when possible; otherwise probes candidates until one loads."
    )]
    async fn favicon_resolve(&self, params: Parameters<FaviconResolveParams>) -> Result<CallToolResult, McpError> {
        resolve_impl(&self.state, params.0).await
    }

    /// Inspect the cache entry for a URL's domain.
    #[tool(description = "Get the cached favicon outcome for a URL's domain, including whether it is still live.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.state.resolver, params.0).await
    }

    /// Purge cache entries.
    #[tool(description = "Purge favicon cache entries: expired ones, one domain, down to a count, or all.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(&self.state.resolver, params.0).await
    }
}

impl ServerHandler for FaviconServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "mcp-favicon".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use favicache_client::{HttpIconLoader, LoadConfig};
    use favicache_core::{CachePolicy, CandidateGenerator, FaviconCache, FaviconResolver, ProviderMode};

    fn server() -> FaviconServer {
        let store = SqliteStore::open_in_memory().unwrap();
        let cache = FaviconCache::new(store, "t:favicon-cache:v1", CachePolicy::default());
        let resolver = FaviconResolver::new(cache, CandidateGenerator::new(ProviderMode::Chain));
        let loader = Arc::new(HttpIconLoader::new(LoadConfig::default()).unwrap());
        FaviconServer::new(Arc::new(AppState::new(resolver, loader)))
    }

    #[test]
    fn test_lists_all_tools() {
        let server = server();
        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(names, vec!["cache_get", "cache_purge", "favicon_candidates", "favicon_resolve"]);
    }

    #[test]
    fn test_server_info() {
        let info = server().get_info();
        assert_eq!(info.server_info.name, "mcp-favicon");
    }
}
