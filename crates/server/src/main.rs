//! mcp-favicon server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use favicache_client::{HttpIconLoader, LoadConfig};
use favicache_core::{AppConfig, open_resolver};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod state;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        provider = %config.provider_mode(),
        db_path = %config.db_path.display(),
        key = %config.storage_key(),
        "Starting mcp-favicon server on stdio transport"
    );

    let resolver = open_resolver(&config)?;
    let loader = HttpIconLoader::new(LoadConfig::from(&config))?;
    let state = Arc::new(state::AppState::new(resolver, Arc::new(loader)));

    let handler = handler::FaviconServer::new(state);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
