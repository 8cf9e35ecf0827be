//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (GLEANER_*)
//! 2. TOML config file (if GLEANER_CONFIG_FILE set)
//! 3. Built-in defaults

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Search engine used to discover candidate pages.
///
/// Deserialized through [`FromStr`], so config files and environment
/// variables accept the same names as the CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum SearchEngine {
    Google,
    #[default]
    DuckDuckGo,
}

impl From<String> for SearchEngine {
    fn from(name: String) -> Self {
        match name.parse() {
            Ok(engine) => engine,
            Err(never) => match never {},
        }
    }
}

impl SearchEngine {
    pub fn name(self) -> &'static str {
        match self {
            SearchEngine::Google => "google",
            SearchEngine::DuckDuckGo => "duckduckgo",
        }
    }
}

impl fmt::Display for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SearchEngine {
    type Err = std::convert::Infallible;

    /// Unrecognized names select Google.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "duckduckgo" | "ddg" => SearchEngine::DuckDuckGo,
            _ => SearchEngine::Google,
        })
    }
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (GLEANER_*)
/// 2. TOML config file (if GLEANER_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    ///
    /// Set via GLEANER_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Discovery engine: `google` or `duckduckgo`.
    ///
    /// Set via GLEANER_ENGINE environment variable.
    #[serde(default)]
    pub engine: SearchEngine,

    /// User-Agent string for discovery and page requests.
    ///
    /// Set via GLEANER_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-URL fetch timeout in milliseconds.
    ///
    /// Set via GLEANER_FETCH_TIMEOUT_MS environment variable.
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Discovery request timeout in milliseconds.
    ///
    /// Set via GLEANER_DISCOVERY_TIMEOUT_MS environment variable.
    #[serde(default = "default_discovery_timeout_ms")]
    pub discovery_timeout_ms: u64,

    /// Fixed delay between discovery and fetch, in milliseconds. 0 disables it.
    ///
    /// Set via GLEANER_RATE_LIMIT_MS environment variable.
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,

    /// Freshness window for cached documents, in seconds.
    ///
    /// Set via GLEANER_CACHE_TTL_SECS environment variable.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Maximum bytes to fetch per page.
    ///
    /// Set via GLEANER_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Result count used when a caller does not give one.
    ///
    /// Set via GLEANER_DEFAULT_COUNT environment variable.
    #[serde(default = "default_count")]
    pub default_count: usize,

    /// Upper bound for requested result counts; larger requests are clamped.
    ///
    /// Set via GLEANER_MAX_COUNT environment variable.
    #[serde(default = "default_max_count")]
    pub max_count: usize,

    /// Maximum number of page fetches running at once.
    ///
    /// Set via GLEANER_MAX_CONCURRENCY environment variable.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Base URL for Google result pages.
    #[serde(default = "default_google_base_url")]
    pub google_base_url: String,

    /// Base URL for DuckDuckGo HTML result pages.
    #[serde(default = "default_duckduckgo_base_url")]
    pub duckduckgo_base_url: String,

    /// Listen address for the REST API.
    ///
    /// Set via GLEANER_HTTP_ADDR environment variable.
    #[serde(default = "default_http_addr")]
    pub http_addr: String,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./gleaner-cache.sqlite")
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
        .into()
}

fn default_fetch_timeout_ms() -> u64 {
    3_000
}

fn default_discovery_timeout_ms() -> u64 {
    10_000
}

fn default_rate_limit_ms() -> u64 {
    1_000
}

fn default_cache_ttl_secs() -> u64 {
    86_400
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_count() -> usize {
    5
}

fn default_max_count() -> usize {
    20
}

fn default_max_concurrency() -> usize {
    8
}

fn default_google_base_url() -> String {
    "https://www.google.com".into()
}

fn default_duckduckgo_base_url() -> String {
    "https://html.duckduckgo.com".into()
}

fn default_http_addr() -> String {
    "127.0.0.1:8080".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            engine: SearchEngine::default(),
            user_agent: default_user_agent(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            discovery_timeout_ms: default_discovery_timeout_ms(),
            rate_limit_ms: default_rate_limit_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
            max_bytes: default_max_bytes(),
            default_count: default_count(),
            max_count: default_max_count(),
            max_concurrency: default_max_concurrency(),
            google_base_url: default_google_base_url(),
            duckduckgo_base_url: default_duckduckgo_base_url(),
            http_addr: default_http_addr(),
        }
    }
}

impl AppConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }

    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `GLEANER_`
    /// 2. TOML file from `GLEANER_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    /// The layered provider stack used by [`AppConfig::load`].
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("GLEANER_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment.merge(
            Env::prefixed("GLEANER_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        )
    }

    /// Extract and validate a configuration from an arbitrary provider stack.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Clamp a caller-supplied result count into `1..=max_count`.
    ///
    /// `None` selects `default_count`.
    pub fn effective_count(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_count).clamp(1, self.max_count)
    }
}
