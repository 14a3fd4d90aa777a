//! Core types and shared functionality for favicache.
//!
//! This crate provides:
//! - Candidate generation for icon providers
//! - The domain-keyed resolution cache with pluggable storage
//! - The resolution driver consumed by rendering layers
//! - Unified error types and configuration

pub mod cache;
pub mod candidates;
pub mod config;
pub mod domain;
pub mod driver;
pub mod error;

pub use cache::{CacheEntry, CachePolicy, FaviconCache, KeyValueStore, MemoryStore, SqliteStore};
pub use candidates::{Candidate, CandidateGenerator, PLACEHOLDER, Provider, ProviderMode};
pub use config::{AppConfig, ConfigError};
pub use driver::{AttemptState, FaviconResolver, Link};
pub use error::Error;

/// Open the configured SQLite slot and build a resolver over it.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or migrated.
pub fn open_resolver(config: &AppConfig) -> Result<FaviconResolver<SqliteStore>, Error> {
    let store = SqliteStore::open(&config.db_path)?;
    let cache = FaviconCache::new(store, config.storage_key(), config.cache_policy());
    Ok(FaviconResolver::new(cache, CandidateGenerator::new(config.provider_mode())))
}
