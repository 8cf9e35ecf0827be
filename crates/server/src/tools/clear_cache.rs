//! clear_cache tool implementation.
//!
//! Evicts one query's cached document, or flushes the whole cache when no
//! query is given.

use gleaner_client::Orchestrator;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the clear_cache tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ClearCacheParams {
    /// Query to evict. Omitted or empty flushes every entry.
    #[serde(default)]
    pub query: Option<String>,
}

/// Implementation of the clear_cache tool.
pub async fn clear_cache_impl(orchestrator: &Orchestrator, params: ClearCacheParams) -> Result<CallToolResult, McpError> {
    let query = params.query.unwrap_or_default();

    orchestrator.evict(&query).await?;

    let message =
        if query.is_empty() { "all cache entries cleared".to_string() } else { format!("cache entry for {:?} cleared", query) };

    Ok(CallToolResult::success(vec![Content::text(message)]))
}
