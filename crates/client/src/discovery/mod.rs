//! Candidate page discovery from search engine result pages.
//!
//! ### Engines
//!
//! - **Google**: `{base}/search?q=..&num=..`, organic results in `div.g`
//!   with an anchor fallback that unwraps `/url?q=` redirects.
//! - **DuckDuckGo**: `{base}/html/?q=..`, results in `a.result__a`
//!   with `uddg` redirect unwrapping.
//!
//! One request per call, no retries. Results are truncated to the requested
//! count and keep the order they appear on the page.

pub mod duckduckgo;
pub mod google;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use gleaner_core::{AppConfig, Error, SearchEngine};
use reqwest::{Client, header};
use scraper::Selector;
use url::Url;

/// One candidate page returned by discovery.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
}

/// Turns a query into an ordered list of candidate pages.
///
/// An empty list is a valid return value.
#[async_trait]
pub trait Discovery: Send + Sync {
    async fn discover(&self, query: &str, count: usize, engine: SearchEngine) -> Result<Vec<SearchHit>, Error>;
}

/// Discovery client configuration.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub user_agent: String,
    pub timeout: Duration,
    pub google_base_url: String,
    pub duckduckgo_base_url: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for DiscoveryConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            timeout: config.discovery_timeout(),
            google_base_url: config.google_base_url.clone(),
            duckduckgo_base_url: config.duckduckgo_base_url.clone(),
        }
    }
}

/// Scrapes public search engine result pages.
#[derive(Debug, Clone)]
pub struct WebDiscovery {
    http: Client,
    config: DiscoveryConfig,
}

impl WebDiscovery {
    pub fn new(config: DiscoveryConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Config(format!("failed to build discovery HTTP client: {}", e)))?;

        Ok(Self::with_client(http, config))
    }

    /// Use an existing HTTP client, e.g. one pointed at a mock server.
    pub fn with_client(http: Client, config: DiscoveryConfig) -> Self {
        Self { http, config }
    }

    async fn fetch_page(&self, url: &Url) -> Result<String, Error> {
        let response = self
            .http
            .get(url.as_str())
            .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Discovery(format!("request to {} timed out", url))
                } else {
                    Error::Discovery(format!("network error for {}: {}", url, e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Discovery(format!("unexpected status {} for {}", status.as_u16(), url)));
        }

        response
            .text()
            .await
            .map_err(|e| Error::Discovery(format!("failed to read result page: {}", e)))
    }
}

#[async_trait]
impl Discovery for WebDiscovery {
    async fn discover(&self, query: &str, count: usize, engine: SearchEngine) -> Result<Vec<SearchHit>, Error> {
        let start = Instant::now();

        let url = match engine {
            SearchEngine::Google => google::search_url(&self.config.google_base_url, query, count)?,
            SearchEngine::DuckDuckGo => duckduckgo::search_url(&self.config.duckduckgo_base_url, query)?,
        };

        tracing::debug!(engine = %engine, "discovering pages: query={}", query);

        let html = self.fetch_page(&url).await?;

        let hits = match engine {
            SearchEngine::Google => google::parse_results(&html, count)?,
            SearchEngine::DuckDuckGo => duckduckgo::parse_results(&html, count)?,
        };

        tracing::debug!("discovery completed in {:?}, {} candidates", start.elapsed(), hits.len());

        Ok(hits)
    }
}

fn selector(css: &str) -> Result<Selector, Error> {
    Selector::parse(css).map_err(|e| Error::Discovery(format!("invalid selector {css}: {e}")))
}

fn element_text(element: &scraper::ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn with_query(base: &str, path: &str, params: &[(&str, String)]) -> Result<Url, Error> {
    let base = base.trim_end_matches('/');
    Url::parse_with_params(&format!("{base}{path}"), params)
        .map_err(|e| Error::Config(format!("invalid discovery base URL {base}: {e}")))
}
