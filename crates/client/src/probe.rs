//! Probe loop: walks a link's candidates with a real loader.
//!
//! The resolver lock is only held between loads, never across one, so other
//! callers can resolve while a probe is waiting on the network.

use serde::Serialize;
use tokio::sync::Mutex;

use favicache_core::{AttemptState, FaviconResolver, KeyValueStore, Link, PLACEHOLDER, domain::domain_of};

use crate::fetch::IconLoader;

/// How a probe run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolveOutcome {
    /// Normalized domain, if the URL had one.
    pub domain: Option<String>,
    /// Address to display.
    pub src: String,
    /// Provider label of `src`.
    pub provider: Option<String>,
    /// Served from the cache without probing.
    pub cached: bool,
    /// Every candidate failed (now, or within the failure TTL).
    pub exhausted: bool,
    /// Number of loads attempted by this run.
    pub attempts: usize,
}

/// Options for a probe run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProbeOptions {
    /// Drop any cached outcome for the domain before walking.
    pub force_refresh: bool,
}

enum Step {
    Cached(String),
    Placeholder { exhausted: bool },
    Try(String),
}

/// Resolve the icon for `link`, loading candidates until one succeeds or all fail.
///
/// Outcomes are recorded in the resolver's cache; the link's attempt state is
/// released when the run ends.
pub async fn resolve_link<S, L>(
    resolver: &Mutex<FaviconResolver<S>>, loader: &L, link: &Link, options: ProbeOptions,
) -> ResolveOutcome
where
    S: KeyValueStore,
    L: IconLoader + ?Sized,
{
    let url = link.url.as_deref();
    let domain = domain_of(url);

    if options.force_refresh {
        let mut r = resolver.lock().await;
        r.cache().forget(url);
        r.release(link);
    }

    let mut attempts = 0;
    let mut first = true;

    loop {
        let step = {
            let mut r = resolver.lock().await;
            let state = r.state(link);
            let cached = if first { r.cache().get(url) } else { None };
            first = false;

            match cached {
                Some(src) => Step::Cached(src),
                None if state == AttemptState::Exhausted || r.cache().is_negative(url) => {
                    Step::Placeholder { exhausted: true }
                }
                None => {
                    let src = r.resolve_display_src(link);
                    if src == PLACEHOLDER { Step::Placeholder { exhausted: false } } else { Step::Try(src) }
                }
            }
        };

        let src = match step {
            Step::Cached(src) => {
                let mut r = resolver.lock().await;
                let provider = r.cache().entry(url).and_then(|e| e.provider);
                r.release(link);
                return ResolveOutcome { domain, src, provider, cached: true, exhausted: false, attempts };
            }
            Step::Placeholder { exhausted } => {
                resolver.lock().await.release(link);
                tracing::debug!(link = %link.id, exhausted, "showing placeholder");
                return ResolveOutcome {
                    domain,
                    src: PLACEHOLDER.to_string(),
                    provider: Some("placeholder".into()),
                    cached: attempts == 0 && exhausted,
                    exhausted,
                    attempts,
                };
            }
            Step::Try(src) => src,
        };

        attempts += 1;
        match loader.load(&src).await {
            Ok(icon) => {
                let mut r = resolver.lock().await;
                r.on_load_success(link, &src);
                let provider = r.cache().entry(url).and_then(|e| e.provider);
                r.release(link);
                tracing::info!(link = %link.id, src = %src, final_url = %icon.final_url, attempts, "resolved favicon");
                return ResolveOutcome { domain, src, provider, cached: false, exhausted: false, attempts };
            }
            Err(e) => {
                tracing::debug!(link = %link.id, src = %src, error = %e, "candidate failed");
                resolver.lock().await.on_load_failure(link);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;
    use std::sync::Arc;
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use bytes::Bytes;
    use favicache_core::cache::ManualClock;
    use favicache_core::{CachePolicy, CandidateGenerator, FaviconCache, MemoryStore, ProviderMode};
    use reqwest::{StatusCode, Url};

    use crate::fetch::{LoadError, LoadedIcon};

    /// Loader that succeeds only for a fixed set of addresses and records every call.
    #[derive(Default)]
    struct FakeLoader {
        ok: HashSet<String>,
        calls: StdMutex<Vec<String>>,
    }

    impl FakeLoader {
        fn accepting(srcs: &[&str]) -> Self {
            Self { ok: srcs.iter().map(|s| s.to_string()).collect(), calls: StdMutex::default() }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl IconLoader for FakeLoader {
        async fn load(&self, src: &str) -> Result<LoadedIcon, LoadError> {
            self.calls.lock().unwrap().push(src.to_string());
            if self.ok.contains(src) {
                Ok(LoadedIcon {
                    src: src.to_string(),
                    final_url: Url::parse(src).unwrap(),
                    status: StatusCode::OK,
                    content_type: Some("image/x-icon".into()),
                    bytes: Bytes::from_static(b"\x00\x00\x01\x00"),
                    fetch_ms: 1,
                })
            } else {
                Err(LoadError::Http("status 404".into()))
            }
        }
    }

    fn resolver(mode: ProviderMode) -> (Mutex<FaviconResolver<MemoryStore>>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let cache = FaviconCache::with_clock(MemoryStore::new(), "t:favicon-cache:v1", CachePolicy::default(), clock.clone());
        (Mutex::new(FaviconResolver::new(cache, CandidateGenerator::new(mode))), clock)
    }

    #[tokio::test]
    async fn test_resolves_first_working_candidate() {
        let (resolver, _) = resolver(ProviderMode::Chain);
        let loader = FakeLoader::accepting(&["https://www.google.com/s2/favicons?domain=example.com&sz=32"]);
        let link = Link::new("1", "https://www.example.com/page");

        let outcome = resolve_link(&resolver, &loader, &link, ProbeOptions::default()).await;
        assert_eq!(outcome.src, "https://www.google.com/s2/favicons?domain=example.com&sz=32");
        assert_eq!(outcome.provider.as_deref(), Some("google"));
        assert_eq!(outcome.domain.as_deref(), Some("example.com"));
        assert_eq!(outcome.attempts, 3);
        assert!(!outcome.cached);
        assert_eq!(
            loader.calls(),
            vec![
                "https://example.com/favicon.ico",
                "https://example.com/apple-touch-icon.png",
                "https://www.google.com/s2/favicons?domain=example.com&sz=32",
            ]
        );
    }

    #[tokio::test]
    async fn test_second_run_is_cached() {
        let (resolver, _) = resolver(ProviderMode::Direct);
        let loader = FakeLoader::accepting(&["https://example.com/favicon.ico"]);
        let link = Link::new("1", "https://example.com");

        resolve_link(&resolver, &loader, &link, ProbeOptions::default()).await;
        let again = resolve_link(&resolver, &loader, &link, ProbeOptions::default()).await;
        assert!(again.cached);
        assert_eq!(again.attempts, 0);
        assert_eq!(again.provider.as_deref(), Some("direct"));
        assert_eq!(loader.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_exhaustion_is_remembered() {
        let (resolver, clock) = resolver(ProviderMode::Chain);
        let loader = FakeLoader::default();
        let link = Link::new("1", "https://dead.example");

        let outcome = resolve_link(&resolver, &loader, &link, ProbeOptions::default()).await;
        assert!(outcome.exhausted);
        assert_eq!(outcome.src, PLACEHOLDER);
        assert_eq!(outcome.attempts, 5);
        assert!(resolver.lock().await.cache().is_negative(Some("https://dead.example")));

        let again = resolve_link(&resolver, &loader, &link, ProbeOptions::default()).await;
        assert!(again.exhausted);
        assert!(again.cached);
        assert_eq!(loader.calls().len(), 5);

        let ttl = resolver.lock().await.cache().policy().ttl_ms(false);
        clock.advance(ttl + 1);
        let retried = resolve_link(&resolver, &loader, &link, ProbeOptions::default()).await;
        assert_eq!(retried.attempts, 5);
        assert_eq!(loader.calls().len(), 10);
    }

    #[tokio::test]
    async fn test_force_refresh_ignores_cache() {
        let (resolver, _) = resolver(ProviderMode::Direct);
        let loader = FakeLoader::accepting(&["https://example.com/favicon.ico"]);
        let link = Link::new("1", "https://example.com");

        resolve_link(&resolver, &loader, &link, ProbeOptions::default()).await;
        let refreshed = resolve_link(&resolver, &loader, &link, ProbeOptions { force_refresh: true }).await;
        assert!(!refreshed.cached);
        assert_eq!(refreshed.attempts, 1);
        assert_eq!(loader.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_none_mode_never_loads() {
        let (resolver, _) = resolver(ProviderMode::None);
        let loader = FakeLoader::default();
        let link = Link::new("1", "https://example.com");

        let outcome = resolve_link(&resolver, &loader, &link, ProbeOptions::default()).await;
        assert_eq!(outcome.src, PLACEHOLDER);
        assert!(!outcome.exhausted);
        assert!(loader.calls().is_empty());
        assert!(resolver.lock().await.cache().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_url_is_placeholder() {
        let (resolver, _) = resolver(ProviderMode::Chain);
        let loader = FakeLoader::default();
        let link = Link::new("1", "javascript:void(0)");

        let outcome = resolve_link(&resolver, &loader, &link, ProbeOptions::default()).await;
        assert_eq!(outcome.src, PLACEHOLDER);
        assert_eq!(outcome.domain, None);
        assert!(loader.calls().is_empty());
    }
}
