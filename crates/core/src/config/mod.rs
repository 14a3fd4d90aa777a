//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (FAVICACHE_*)
//! 2. TOML config file (if FAVICACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::cache::{CachePolicy, SCHEMA_VERSION};
use crate::candidates::ProviderMode;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (FAVICACHE_*)
/// 2. TOML config file (if FAVICACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Provider mode: none, direct, google, duckduckgo, raycast or chain.
    ///
    /// Set via FAVICACHE_PROVIDER environment variable. Kept as a raw string
    /// so that an unknown value falls back instead of failing the load.
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Prefix of the storage key holding the cache blob.
    ///
    /// Set via FAVICACHE_NAMESPACE environment variable.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Path to the SQLite database backing the cache slot.
    ///
    /// Set via FAVICACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Lifetime of a successful resolution, in seconds.
    ///
    /// Set via FAVICACHE_SUCCESS_TTL_SECS environment variable.
    #[serde(default = "default_success_ttl_secs")]
    pub success_ttl_secs: u64,

    /// Lifetime of an exhausted resolution, in seconds.
    ///
    /// Set via FAVICACHE_FAILURE_TTL_SECS environment variable.
    #[serde(default = "default_failure_ttl_secs")]
    pub failure_ttl_secs: u64,

    /// Maximum number of domains kept in the cache.
    ///
    /// Set via FAVICACHE_MAX_ENTRIES environment variable.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// User-Agent string for icon probes.
    ///
    /// Set via FAVICACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-candidate probe timeout in milliseconds.
    ///
    /// Set via FAVICACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum icon body size accepted by a probe.
    ///
    /// Set via FAVICACHE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Refuse to probe hosts resolving to private or reserved addresses.
    ///
    /// Set via FAVICACHE_BLOCK_PRIVATE environment variable.
    #[serde(default = "default_true")]
    pub block_private: bool,
}

fn default_provider() -> String {
    ProviderMode::default().as_str().into()
}

fn default_namespace() -> String {
    "favicache".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./favicache.sqlite")
}

fn default_success_ttl_secs() -> u64 {
    7 * 24 * 60 * 60
}

fn default_failure_ttl_secs() -> u64 {
    10 * 60
}

fn default_max_entries() -> usize {
    500
}

fn default_user_agent() -> String {
    "favicache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_max_bytes() -> usize {
    1_048_576 // 1MB
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            namespace: default_namespace(),
            db_path: default_db_path(),
            success_ttl_secs: default_success_ttl_secs(),
            failure_ttl_secs: default_failure_ttl_secs(),
            max_entries: default_max_entries(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            block_private: true,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The configured provider mode, falling back to the default on unknown values.
    pub fn provider_mode(&self) -> ProviderMode {
        ProviderMode::parse_or_default(&self.provider)
    }

    /// Expiry and capacity policy for the resolution cache.
    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy {
            success_ttl: Duration::from_secs(self.success_ttl_secs),
            failure_ttl: Duration::from_secs(self.failure_ttl_secs),
            max_entries: self.max_entries,
        }
    }

    /// Storage key of the cache blob: `<namespace>:favicon-cache:v<version>`.
    pub fn storage_key(&self) -> String {
        format!("{}:favicon-cache:v{}", self.namespace, SCHEMA_VERSION)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `FAVICACHE_`
    /// 2. TOML file from `FAVICACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("FAVICACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("FAVICACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
