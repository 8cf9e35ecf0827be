//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

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

impl From<ConfigError> for crate::Error {
    fn from(err: ConfigError) -> Self {
        crate::Error::Config(err.to_string())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

fn check_timeout(field: &str, value: u64) -> Result<(), ConfigError> {
    if value < 100 {
        return Err(invalid(field, "must be at least 100ms"));
    }
    if value > 300_000 {
        return Err(invalid(field, "must not exceed 5 minutes (300000ms)"));
    }
    Ok(())
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - a timeout is below 100ms or above 5 minutes
    /// - `user_agent` or `db_path` is empty
    /// - `cache_ttl_secs` or `max_concurrency` is 0
    /// - `max_count` is outside 1-100 or `default_count` exceeds it
    /// - a discovery base URL does not parse
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        check_timeout("fetch_timeout_ms", self.fetch_timeout_ms)?;
        check_timeout("discovery_timeout_ms", self.discovery_timeout_ms)?;

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }
        if self.db_path.as_os_str().is_empty() {
            return Err(invalid("db_path", "must not be empty"));
        }

        if self.cache_ttl_secs == 0 {
            return Err(invalid("cache_ttl_secs", "must be greater than 0"));
        }

        if self.max_count == 0 || self.max_count > 100 {
            return Err(invalid("max_count", "must be between 1 and 100"));
        }
        if self.default_count == 0 || self.default_count > self.max_count {
            return Err(invalid("default_count", "must be between 1 and max_count"));
        }
        if self.max_concurrency == 0 {
            return Err(invalid("max_concurrency", "must be at least 1"));
        }

        for (field, value) in [("google_base_url", &self.google_base_url), ("duckduckgo_base_url", &self.duckduckgo_base_url)]
        {
            url::Url::parse(value).map_err(|e| invalid(field, &e.to_string()))?;
        }

        if self.rate_limit_ms > 60_000 {
            tracing::warn!(rate_limit_ms = self.rate_limit_ms, "rate limit delay exceeds one minute per search");
        }

        Ok(())
    }
}
