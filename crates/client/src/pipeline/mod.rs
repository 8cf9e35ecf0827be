//! Cache-aware search pipeline.
//!
//! ```text
//! force        -> DISCOVER
//! !force       -> CHECK_CACHE
//! CHECK_CACHE  -> hit: RETURN(from_cache) | miss: DISCOVER
//! DISCOVER     -> no candidates: NO_RESULTS | candidates: RATE_LIMIT_WAIT
//! RATE_LIMIT_WAIT -> FETCH -> CONSOLIDATE
//! CONSOLIDATE  -> nothing survived: ALL_SOURCES_FAILED | STORE -> RETURN
//! ```
//!
//! Cache read and write failures fail the call. The cache is only written
//! after a run produced at least one section.

pub mod consolidate;

pub use consolidate::{SECTION_DIVIDER, consolidate, count_sections};

use std::sync::Arc;
use std::time::{Duration, Instant};

use gleaner_core::{AppConfig, CacheDb, Error, SearchEngine, canonicalize_query};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::discovery::{Discovery, DiscoveryConfig, WebDiscovery};
use crate::extract::ReadableExtractor;
use crate::fetch::{FetchClient, FetchConfig, PageFetcher, PageFetcherConfig};

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchOutcome {
    pub content: String,
    pub result_count: usize,
    pub from_cache: bool,
}

/// Process-wide pipeline settings.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub engine: SearchEngine,
    /// Delay between discovery and fetch. Zero skips the wait.
    pub rate_limit: Duration,
    /// Requested counts above this are clamped.
    pub max_count: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for PipelineConfig {
    fn from(config: &AppConfig) -> Self {
        Self { engine: config.engine, rate_limit: config.rate_limit(), max_count: config.max_count }
    }
}

/// Drives a query through cache, discovery, fetch and consolidation.
///
/// Cheap to clone; clones share the cache connection.
#[derive(Clone)]
pub struct Orchestrator {
    cache: CacheDb,
    discovery: Arc<dyn Discovery>,
    fetcher: PageFetcher,
    config: PipelineConfig,
}

impl Orchestrator {
    pub fn new(cache: CacheDb, discovery: Arc<dyn Discovery>, fetcher: PageFetcher, config: PipelineConfig) -> Self {
        Self { cache, discovery, fetcher, config }
    }

    /// Open the cache and build the network collaborators from configuration.
    ///
    /// Fails with `CONFIG_ERROR` when the cache file cannot be opened.
    pub async fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let cache = CacheDb::open(&config.db_path).await?.with_ttl(config.cache_ttl());
        let discovery = WebDiscovery::new(DiscoveryConfig::from(config))?;
        let client = FetchClient::new(FetchConfig::from(config))?;
        let fetcher = PageFetcher::new(client, Arc::new(ReadableExtractor::default()), PageFetcherConfig::from(config));

        tracing::info!(db_path = %config.db_path.display(), engine = %config.engine, "search pipeline ready");

        Ok(Self::new(cache, Arc::new(discovery), fetcher, PipelineConfig::from(config)))
    }

    pub fn cache(&self) -> &CacheDb {
        &self.cache
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline for `query`, returning up to `count` consolidated pages.
    pub async fn run(&self, query: &str, count: usize, force: bool) -> Result<SearchOutcome, Error> {
        self.run_with_cancel(query, count, force, &CancellationToken::new()).await
    }

    /// Like [`Orchestrator::run`], observing `cancel`.
    ///
    /// Cancellation during discovery or the rate-limit wait fails the call
    /// with `CANCELLED`. During fetch, unfinished pages become failures and
    /// the run continues with whatever completed.
    pub async fn run_with_cancel(
        &self, query: &str, count: usize, force: bool, cancel: &CancellationToken,
    ) -> Result<SearchOutcome, Error> {
        if query.trim().is_empty() {
            return Err(Error::InvalidInput("query cannot be empty".into()));
        }
        if count == 0 {
            return Err(Error::InvalidInput("count must be greater than 0".into()));
        }
        let count = count.min(self.config.max_count);

        let start = Instant::now();
        let key = canonicalize_query(query);

        if !force && let Some(entry) = self.cache.get_fresh(&key).await? {
            let result_count = entry.result_count.map_or_else(|| count_sections(&entry.content), |c| c as usize);
            tracing::debug!(key = %key, result_count, "cache hit");
            return Ok(SearchOutcome { content: entry.content, result_count, from_cache: true });
        }

        tracing::debug!(key = %key, force, "cache bypassed or missed");

        let hits = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled("discovery cancelled".into())),
            hits = self.discovery.discover(query, count, self.config.engine) => hits?,
        };

        if hits.is_empty() {
            return Err(Error::NoResults(format!("no search results for {:?}", query)));
        }

        if !self.config.rate_limit.is_zero() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled("rate limit wait cancelled".into())),
                _ = tokio::time::sleep(self.config.rate_limit) => {}
            }
        }

        let urls: Vec<String> = hits.into_iter().map(|h| h.url).collect();
        let results = self.fetcher.fetch_all(&urls, cancel).await;

        let (content, result_count) = consolidate(&results);
        if result_count == 0 {
            return Err(Error::AllSourcesFailed(format!("all {} pages failed for {:?}", urls.len(), query)));
        }

        self.cache.set_with_count(&key, &content, result_count as u64).await?;

        tracing::info!(
            key = %key,
            candidates = urls.len(),
            result_count,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "search pipeline complete"
        );

        Ok(SearchOutcome { content, result_count, from_cache: false })
    }

    /// Remove the cached document for `query`; an empty query clears the whole cache.
    ///
    /// Returns the number of removed entries. Removing nothing succeeds.
    pub async fn evict(&self, query: &str) -> Result<u64, Error> {
        let key = if query.is_empty() { String::new() } else { canonicalize_query(query) };
        let removed = self.cache.evict(&key).await?;
        tracing::info!(all = key.is_empty(), removed, "cache evicted");
        Ok(removed)
    }

    /// Delete every stale cache row.
    pub async fn prune(&self) -> Result<u64, Error> {
        let removed = self.cache.purge_stale().await?;
        tracing::info!(removed, "stale cache entries pruned");
        Ok(removed)
    }

    /// Close the cache connection. Clones of this orchestrator fail afterwards.
    pub async fn shutdown(self) -> Result<(), Error> {
        self.cache.close().await
    }
}
