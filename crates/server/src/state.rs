//! Shared server state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use favicache_client::IconLoader;
use favicache_core::{FaviconResolver, KeyValueStore, Link};
use tokio::sync::Mutex;

/// Resolver and loader shared by every tool call.
pub struct AppState<S: KeyValueStore> {
    pub resolver: Mutex<FaviconResolver<S>>,
    pub loader: Arc<dyn IconLoader>,
    next_link: AtomicU64,
}

impl<S: KeyValueStore> AppState<S> {
    pub fn new(resolver: FaviconResolver<S>, loader: Arc<dyn IconLoader>) -> Self {
        Self { resolver: Mutex::new(resolver), loader, next_link: AtomicU64::new(1) }
    }

    /// A link with a fresh identity, so concurrent calls never share attempt state.
    pub fn link_for(&self, url: &str) -> Link {
        let id = self.next_link.fetch_add(1, Ordering::Relaxed);
        Link::new(format!("mcp-{id}"), url)
    }
}
