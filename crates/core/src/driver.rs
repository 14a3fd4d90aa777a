//! Resolution driver: decides which address a link should display next.
//!
//! The driver never loads anything itself. The rendering layer asks
//! [`FaviconResolver::resolve_display_src`] what to show, attempts the load,
//! and reports back through [`FaviconResolver::on_load_success`] or
//! [`FaviconResolver::on_load_failure`].
//!
//! Per link the walk is `Untried -> Trying(i) -> {Resolved | Exhausted}`.
//! That state is in-memory and scoped to the current render session; only the
//! terminal outcome is persisted, through the cache.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::cache::{EXHAUSTED_LABEL, FaviconCache, KeyValueStore};
use crate::candidates::{CandidateGenerator, PLACEHOLDER};

/// Label recorded when a loaded address is not one of the generated candidates.
pub const EXTERNAL_LABEL: &str = "external";

/// A rendered link: a stable identity plus the URL it points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub id: String,
    pub url: Option<String>,
}

impl Link {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self { id: id.into(), url: Some(url.into()) }
    }

    /// Link without a URL (e.g. a folder or a separator).
    pub fn without_url(id: impl Into<String>) -> Self {
        Self { id: id.into(), url: None }
    }

    fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

/// Where a link is in its resolution walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "state", content = "index", rename_all = "lowercase")]
pub enum AttemptState {
    Untried,
    Trying(usize),
    Resolved,
    Exhausted,
}

#[derive(Debug, Clone)]
struct Attempt {
    url: Option<String>,
    state: AttemptState,
}

/// Orchestrates candidate iteration against the resolution cache.
#[derive(Debug)]
pub struct FaviconResolver<S: KeyValueStore> {
    cache: FaviconCache<S>,
    generator: CandidateGenerator,
    attempts: HashMap<String, Attempt>,
}

impl<S: KeyValueStore> FaviconResolver<S> {
    pub fn new(cache: FaviconCache<S>, generator: CandidateGenerator) -> Self {
        Self { cache, generator, attempts: HashMap::new() }
    }

    pub fn cache(&mut self) -> &mut FaviconCache<S> {
        &mut self.cache
    }

    pub fn generator(&self) -> &CandidateGenerator {
        &self.generator
    }

    /// Ordered candidate addresses for a link.
    pub fn candidates(&self, link: &Link) -> Vec<String> {
        self.generator.candidates(link.url())
    }

    /// What to render for `link` right now.
    ///
    /// A live cached address wins. A link that has exhausted its candidates,
    /// or whose domain is negatively cached, shows the placeholder. Otherwise
    /// the candidate at the link's current attempt index is returned.
    pub fn resolve_display_src(&mut self, link: &Link) -> String {
        if let Some(src) = self.cache.get(link.url()) {
            return src;
        }

        let state = self.state(link);
        if state == AttemptState::Exhausted || self.cache.is_negative(link.url()) {
            return PLACEHOLDER.to_string();
        }

        let candidates = self.candidates(link);
        let index = match state {
            AttemptState::Trying(i) => i,
            _ => 0,
        };
        candidates
            .get(index)
            .or_else(|| candidates.first())
            .cloned()
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    }

    /// The rendering layer loaded `resolved` for `link`.
    ///
    /// Loading the placeholder says nothing about the site and changes nothing.
    pub fn on_load_success(&mut self, link: &Link, resolved: &str) {
        if resolved == PLACEHOLDER {
            return;
        }
        let label = self
            .generator
            .provider_of(link.url(), resolved)
            .map_or(EXTERNAL_LABEL, |p| p.label());
        self.cache.remember(link.url(), resolved, label);
        self.attempt_mut(link).state = AttemptState::Resolved;
    }

    /// The rendering layer failed to load the address it was given for `link`.
    ///
    /// While the domain has a live negative entry the link was showing the
    /// placeholder, so the failure is ignored and the entry's age is kept.
    pub fn on_load_failure(&mut self, link: &Link) {
        let state = self.state(link);
        if state == AttemptState::Exhausted || self.cache.is_negative(link.url()) {
            return;
        }
        let last = self.candidates(link).len().saturating_sub(1);

        let next = match state {
            AttemptState::Exhausted => return,
            AttemptState::Untried | AttemptState::Resolved if self.cache.get(link.url()).is_some() => {
                tracing::debug!(link = %link.id, "cached favicon failed to load; re-resolving");
                self.cache.forget(link.url());
                AttemptState::Trying(0)
            }
            AttemptState::Untried | AttemptState::Resolved => advance(0, last),
            AttemptState::Trying(i) => advance(i, last),
        };

        if next == AttemptState::Exhausted {
            tracing::debug!(link = %link.id, url = ?link.url, "favicon candidates exhausted");
            self.cache.remember_failure(link.url(), EXHAUSTED_LABEL);
        }
        self.attempt_mut(link).state = next;
    }

    /// Current position of `link` in its walk.
    pub fn state(&self, link: &Link) -> AttemptState {
        match self.attempts.get(&link.id) {
            Some(attempt) if attempt.url == link.url => attempt.state,
            _ => AttemptState::Untried,
        }
    }

    /// Index of the candidate `link` is currently trying.
    pub fn current_attempt_index(&self, link: &Link) -> usize {
        match self.state(link) {
            AttemptState::Trying(i) => i,
            AttemptState::Exhausted => self.candidates(link).len().saturating_sub(1),
            AttemptState::Untried | AttemptState::Resolved => 0,
        }
    }

    /// Forget all per-link attempt state (new render session).
    pub fn reset(&mut self) {
        self.attempts.clear();
    }

    /// Drop the attempt state of a single link.
    pub fn release(&mut self, link: &Link) {
        self.attempts.remove(&link.id);
    }

    /// Keep attempt state only for links whose ids are in `ids`.
    pub fn retain_links<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        let keep: std::collections::HashSet<&str> = ids.into_iter().collect();
        self.attempts.retain(|id, _| keep.contains(id.as_str()));
    }

    fn attempt_mut(&mut self, link: &Link) -> &mut Attempt {
        let attempt = self
            .attempts
            .entry(link.id.clone())
            .or_insert_with(|| Attempt { url: link.url.clone(), state: AttemptState::Untried });
        if attempt.url != link.url {
            *attempt = Attempt { url: link.url.clone(), state: AttemptState::Untried };
        }
        attempt
    }
}

fn advance(current: usize, last: usize) -> AttemptState {
    if current >= last { AttemptState::Exhausted } else { AttemptState::Trying(current + 1) }
}
