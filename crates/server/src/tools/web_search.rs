//! web_search tool implementation.
//!
//! Runs the search pipeline and returns the consolidated document, served from
//! the cache when a fresh entry exists.

use gleaner_client::Orchestrator;
use gleaner_core::AppConfig;
use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Input parameters for web_search tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct WebSearchParams {
    /// Search query (required).
    pub query: String,

    /// Number of result pages to fetch. Missing or non-positive values use the
    /// configured default; large values are clamped.
    #[serde(default)]
    pub count: Option<i64>,

    /// Bypass the cache and fetch fresh results.
    #[serde(default)]
    pub force: bool,
}

/// Implementation of the web_search tool.
pub async fn search_impl(
    orchestrator: &Orchestrator, config: &AppConfig, params: WebSearchParams,
) -> Result<CallToolResult, McpError> {
    let requested = params.count.filter(|c| *c > 0).map(|c| c as usize);
    let count = config.effective_count(requested);

    let outcome = orchestrator.run(&params.query, count, params.force).await?;

    let text = format!("[results: {}, from_cache: {}]\n\n{}", outcome.result_count, outcome.from_cache, outcome.content);

    Ok(CallToolResult::success(vec![Content::text(text)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{orchestrator, page};
    use wiremock::MockServer;

    fn text_of(result: &CallToolResult) -> String {
        let content_val = serde_json::to_value(&result.content[0]).unwrap();
        content_val
            .get("text")
            .and_then(|v| v.as_str())
            .expect("Expected text field in content")
            .to_string()
    }

    #[test]
    fn test_params_defaults() {
        let params: WebSearchParams = serde_json::from_str(r#"{"query": "rust"}"#).unwrap();
        assert_eq!(params.count, None);
        assert!(!params.force);
    }

    #[tokio::test]
    async fn test_search_then_cached() {
        let server = MockServer::start().await;
        let u1 = page(&server, "/u1", "Goroutines...").await;
        let orch = orchestrator(vec![u1.clone()]).await;
        let config = AppConfig::default();

        let params = WebSearchParams { query: "golang".into(), count: Some(3), force: false };
        let first = search_impl(&orch, &config, params.clone()).await.unwrap();
        assert_eq!(text_of(&first), format!("[results: 1, from_cache: false]\n\n## {u1}\n\nGoroutines..."));

        let second = search_impl(&orch, &config, params).await.unwrap();
        assert!(text_of(&second).starts_with("[results: 1, from_cache: true]\n\n"));
    }

    #[tokio::test]
    async fn test_non_positive_count_uses_default() {
        let server = MockServer::start().await;
        let u1 = page(&server, "/u1", "text").await;
        let orch = orchestrator(vec![u1]).await;

        let params = WebSearchParams { query: "golang".into(), count: Some(-4), force: false };
        assert!(search_impl(&orch, &AppConfig::default(), params).await.is_ok());
    }

    #[tokio::test]
    async fn test_no_results_is_error() {
        let orch = orchestrator(vec![]).await;
        let params = WebSearchParams { query: "nothing".into(), ..Default::default() };

        let err = search_impl(&orch, &AppConfig::default(), params).await.unwrap_err();
        assert!(err.message.starts_with("NO_RESULTS"));
    }

    #[tokio::test]
    async fn test_empty_query_is_invalid() {
        let orch = orchestrator(vec![]).await;
        let err = search_impl(&orch, &AppConfig::default(), WebSearchParams::default()).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
    }
}
