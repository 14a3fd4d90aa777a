//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::candidates::ProviderMode;
use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// An unrecognized `provider` is not an error; it is reported and the
    /// default mode is used.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_entries` is 0 or exceeds 100000
    /// - either TTL is 0, or `failure_ttl_secs` is not shorter than `success_ttl_secs`
    /// - `timeout_ms` is less than 100ms or exceeds 1 minute
    /// - `max_bytes` is 0 or exceeds 10MB
    ///
    /// Returns `ConfigError::Missing` if `namespace` or `user_agent` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_entries == 0 {
            return Err(ConfigError::Invalid { field: "max_entries".into(), reason: "must be greater than 0".into() });
        }
        if self.max_entries > 100_000 {
            return Err(ConfigError::Invalid { field: "max_entries".into(), reason: "must not exceed 100000".into() });
        }

        if self.success_ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "success_ttl_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.failure_ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "failure_ttl_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.failure_ttl_secs >= self.success_ttl_secs {
            return Err(ConfigError::Invalid {
                field: "failure_ttl_secs".into(),
                reason: "must be shorter than success_ttl_secs".into(),
            });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 60_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 1 minute (60000ms)".into(),
            });
        }

        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 10 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 10MB".into() });
        }

        if self.namespace.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "namespace".into(),
                hint: "Set FAVICACHE_NAMESPACE or leave it unset for the default".into(),
            });
        }
        if self.user_agent.is_empty() {
            return Err(ConfigError::Missing {
                field: "user_agent".into(),
                hint: "Set FAVICACHE_USER_AGENT or leave it unset for the default".into(),
            });
        }

        if ProviderMode::parse(&self.provider).is_none() {
            tracing::warn!(
                provider = %self.provider,
                fallback = ProviderMode::default().as_str(),
                "Unrecognized provider mode; using fallback"
            );
        }

        Ok(())
    }
}
