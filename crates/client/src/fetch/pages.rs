//! Concurrent fetch and extraction for a batch of result pages.

use std::sync::Arc;
use std::time::Duration;

use gleaner_core::{AppConfig, Error};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::FetchClient;
use crate::extract::Extractor;

/// Outcome for one requested URL.
///
/// Exactly one of `text` (non-failed) or `error` is meaningful.
#[derive(Debug)]
pub struct FetchResult {
    pub source_url: String,
    pub text: String,
    pub error: Option<Error>,
}

impl FetchResult {
    pub fn success(source_url: impl Into<String>, text: impl Into<String>) -> Self {
        Self { source_url: source_url.into(), text: text.into(), error: None }
    }

    pub fn failure(source_url: impl Into<String>, error: Error) -> Self {
        Self { source_url: source_url.into(), text: String::new(), error: Some(error) }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Batch fetch settings.
#[derive(Debug, Clone)]
pub struct PageFetcherConfig {
    /// Deadline for one URL, covering the request and extraction.
    pub timeout: Duration,

    /// Maximum number of URLs in flight at once.
    pub max_concurrency: usize,
}

impl Default for PageFetcherConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for PageFetcherConfig {
    fn from(config: &AppConfig) -> Self {
        Self { timeout: config.fetch_timeout(), max_concurrency: config.max_concurrency }
    }
}

/// Fans a URL list out to one task per URL and joins on all of them.
#[derive(Clone)]
pub struct PageFetcher {
    client: Arc<FetchClient>,
    extractor: Arc<dyn Extractor>,
    config: PageFetcherConfig,
}

impl PageFetcher {
    pub fn new(client: FetchClient, extractor: Arc<dyn Extractor>, config: PageFetcherConfig) -> Self {
        Self { client: Arc::new(client), extractor, config }
    }

    pub fn config(&self) -> &PageFetcherConfig {
        &self.config
    }

    /// Fetch and extract every URL, returning one result per input in input order.
    ///
    /// Tasks are never skipped or retried. A slow or failing URL does not affect
    /// its siblings. Cancelling `cancel` resolves every unfinished URL as a
    /// `Cancelled` failure; the call still returns a full result list.
    pub async fn fetch_all(&self, urls: &[String], cancel: &CancellationToken) -> Vec<FetchResult> {
        if urls.is_empty() {
            return Vec::new();
        }

        let permits = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for (idx, url) in urls.iter().enumerate() {
            let client = Arc::clone(&self.client);
            let extractor = Arc::clone(&self.extractor);
            let permits = Arc::clone(&permits);
            let cancel = cancel.clone();
            let timeout = self.config.timeout;
            let url = url.clone();

            tasks.spawn(async move {
                let outcome = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(Error::Cancelled(format!("fetch of {url} cancelled"))),
                    outcome = run_one(&client, extractor, &permits, &url, timeout) => outcome,
                };

                let result = match outcome {
                    Ok(text) => FetchResult::success(url, text),
                    Err(e) => {
                        tracing::warn!(url = %url, code = e.code(), "page fetch failed: {}", e);
                        FetchResult::failure(url, e)
                    }
                };
                (idx, result)
            });
        }

        let mut slots: Vec<Option<FetchResult>> = (0..urls.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, result)) => slots[idx] = Some(result),
                Err(e) => tracing::error!("page fetch task aborted: {}", e),
            }
        }

        let results: Vec<FetchResult> = slots
            .into_iter()
            .zip(urls)
            .map(|(slot, url)| {
                slot.unwrap_or_else(|| FetchResult::failure(url.clone(), Error::HttpError(format!("fetch task for {url} aborted"))))
            })
            .collect();

        let ok = results.iter().filter(|r| r.is_success()).count();
        tracing::info!(requested = urls.len(), succeeded = ok, "page fetch batch complete");

        results
    }
}

async fn run_one(
    client: &FetchClient, extractor: Arc<dyn Extractor>, permits: &Semaphore, url: &str, timeout: Duration,
) -> Result<String, Error> {
    let _permit = permits.acquire().await.map_err(|e| Error::Cancelled(format!("fetch pool closed: {e}")))?;

    match tokio::time::timeout(timeout, fetch_one(client, extractor, url)).await {
        Ok(result) => result,
        Err(_) => Err(Error::FetchTimeout(format!("{url} exceeded {}ms", timeout.as_millis()))),
    }
}

/// Extraction is CPU-bound, so it runs on the blocking pool where the
/// surrounding timeout can still fire and sibling tasks keep their worker.
async fn fetch_one(client: &FetchClient, extractor: Arc<dyn Extractor>, url: &str) -> Result<String, Error> {
    let response = client.fetch(url).await?;
    tokio::task::spawn_blocking(move || extractor.extract(&response.bytes, &response.final_url))
        .await
        .map_err(|e| Error::ExtractFailed(format!("extraction task for {url} failed: {e}")))?
}
