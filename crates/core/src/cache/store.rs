//! The resolution cache: domain -> last known outcome.
//!
//! The map is loaded from its slot on first access and written back whole
//! after every mutation. Storage failures never reach the caller: a slot that
//! cannot be read or parsed is an empty cache, and a failed write is logged
//! and retried implicitly by the next one.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::backend::KeyValueStore;
use super::clock::{Clock, SystemClock};
use super::entry::{CacheEntry, CachePolicy};
use crate::domain::domain_of;

type Entries = BTreeMap<String, CacheEntry>;

/// Domain-keyed favicon cache over a single key/value slot.
///
/// Concurrent writers to the same slot are not coordinated; the last full
/// rewrite wins.
pub struct FaviconCache<S: KeyValueStore> {
    store: S,
    key: String,
    policy: CachePolicy,
    clock: Arc<dyn Clock>,
    entries: Option<Entries>,
}

impl<S: KeyValueStore> std::fmt::Debug for FaviconCache<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaviconCache")
            .field("key", &self.key)
            .field("policy", &self.policy)
            .field("loaded", &self.entries.as_ref().map(BTreeMap::len))
            .finish_non_exhaustive()
    }
}

impl<S: KeyValueStore> FaviconCache<S> {
    /// Cache over `store` using the slot named `key` and the wall clock.
    pub fn new(store: S, key: impl Into<String>, policy: CachePolicy) -> Self {
        Self::with_clock(store, key, policy, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, key: impl Into<String>, policy: CachePolicy, clock: Arc<dyn Clock>) -> Self {
        Self { store, key: key.into(), policy, clock, entries: None }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Cached icon address for `url`'s domain, if a live success entry exists.
    ///
    /// An expired entry is deleted by this read.
    pub fn get(&mut self, url: Option<&str>) -> Option<String> {
        let domain = domain_of(url)?;
        self.live_entry(&domain).filter(|e| e.ok).map(|e| e.src)
    }

    /// Whether a live failure entry exists for `url`'s domain.
    ///
    /// An expired entry is deleted by this read.
    pub fn is_negative(&mut self, url: Option<&str>) -> bool {
        let Some(domain) = domain_of(url) else {
            return false;
        };
        self.live_entry(&domain).is_some_and(|e| !e.ok)
    }

    /// Record a successful resolution. Empty addresses are ignored.
    pub fn remember(&mut self, url: Option<&str>, src: &str, provider: &str) {
        if src.is_empty() {
            return;
        }
        let Some(domain) = domain_of(url) else {
            return;
        };
        let entry = CacheEntry::success(src, self.clock.now_ms(), provider);
        tracing::debug!(%domain, src, provider, "remembering favicon");
        self.entries_mut().insert(domain.clone(), entry);
        self.prune(&domain);
        self.persist();
    }

    /// Record that every candidate for `url`'s domain failed.
    pub fn remember_failure(&mut self, url: Option<&str>, provider: &str) {
        let Some(domain) = domain_of(url) else {
            return;
        };
        let entry = CacheEntry::failure(self.clock.now_ms(), provider);
        tracing::debug!(%domain, provider, "remembering favicon failure");
        self.entries_mut().insert(domain.clone(), entry);
        self.prune(&domain);
        self.persist();
    }

    /// Raw entry for `url`'s domain, expired or not.
    pub fn entry(&mut self, url: Option<&str>) -> Option<CacheEntry> {
        let domain = domain_of(url)?;
        self.entries_mut().get(&domain).cloned()
    }

    /// Whether `entry` is still within its TTL right now.
    pub fn is_live(&self, entry: &CacheEntry) -> bool {
        !entry.is_expired(self.clock.now_ms(), &self.policy)
    }

    /// Every entry, ordered by domain.
    pub fn entries(&mut self) -> Vec<(String, CacheEntry)> {
        self.entries_mut()
            .iter()
            .map(|(domain, entry)| (domain.clone(), entry.clone()))
            .collect()
    }

    pub fn len(&mut self) -> usize {
        self.entries_mut().len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    /// Drop the entry for `url`'s domain. Returns whether one existed.
    pub fn forget(&mut self, url: Option<&str>) -> bool {
        let Some(domain) = domain_of(url) else {
            return false;
        };
        let removed = self.entries_mut().remove(&domain).is_some();
        if removed {
            self.persist();
        }
        removed
    }

    /// Drop every expired entry. Returns the number removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let policy = self.policy;
        let entries = self.entries_mut();
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(now, &policy));
        let removed = before - entries.len();
        if removed > 0 {
            self.persist();
        }
        removed
    }

    /// Keep only the `max` most recently written entries. Returns the number removed.
    pub fn purge_to(&mut self, max: usize) -> usize {
        let removed = evict_oldest(self.entries_mut(), max, None);
        if removed > 0 {
            self.persist();
        }
        removed
    }

    /// Drop everything. Returns the number removed.
    pub fn clear(&mut self) -> usize {
        let entries = self.entries_mut();
        let removed = entries.len();
        entries.clear();
        if removed > 0 {
            self.persist();
        }
        removed
    }

    /// Entry for `domain` if it is still live; an expired one is deleted.
    fn live_entry(&mut self, domain: &str) -> Option<CacheEntry> {
        let now = self.clock.now_ms();
        let policy = self.policy;
        let entry = self.entries_mut().get(domain)?.clone();

        if entry.is_expired(now, &policy) {
            tracing::debug!(domain, ok = entry.ok, "favicon cache entry expired");
            self.entries_mut().remove(domain);
            self.persist();
            return None;
        }

        Some(entry)
    }

    /// Enforce the capacity bound after writing `written`, which always survives.
    fn prune(&mut self, written: &str) {
        let max = self.policy.max_entries;
        let removed = evict_oldest(self.entries_mut(), max, Some(written));
        if removed > 0 {
            tracing::debug!(removed, max, "evicted oldest favicon cache entries");
        }
    }

    fn entries_mut(&mut self) -> &mut Entries {
        if self.entries.is_none() {
            self.entries = Some(self.load());
        }
        self.entries.get_or_insert_with(Entries::new)
    }

    fn load(&self) -> Entries {
        let raw = match self.store.load(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Entries::new(),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "favicon cache unreadable; starting empty");
                return Entries::new();
            }
        };

        match serde_json::from_str::<Entries>(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "favicon cache corrupt; starting empty");
                Entries::new()
            }
        }
    }

    fn persist(&mut self) {
        let Some(entries) = self.entries.as_ref() else {
            return;
        };
        let result = serde_json::to_string(entries)
            .map_err(crate::Error::from)
            .and_then(|json| self.store.save(&self.key, &json));
        if let Err(e) = result {
            tracing::warn!(key = %self.key, error = %e, "failed to persist favicon cache");
        }
    }
}

/// Remove the oldest-by-`at` entries until at most `max` remain.
///
/// `keep` is never evicted, so a write sharing its millisecond with older
/// entries is not dropped in favour of them.
fn evict_oldest(entries: &mut Entries, max: usize, keep: Option<&str>) -> usize {
    if entries.len() <= max {
        return 0;
    }

    let mut by_age: Vec<(i64, String)> = entries
        .iter()
        .filter(|(d, _)| Some(d.as_str()) != keep)
        .map(|(d, e)| (e.at, d.clone()))
        .collect();
    by_age.sort();

    let excess = entries.len() - max;
    let mut removed = 0;
    for (_, domain) in by_age.into_iter().take(excess) {
        entries.remove(&domain);
        removed += 1;
    }
    removed
}
