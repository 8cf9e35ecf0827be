//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use crate::tools::{ClearCacheParams, WebSearchParams, clear_cache_impl, search_impl};

use gleaner_client::Orchestrator;
use gleaner_core::AppConfig;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for gleaner.
#[derive(Clone)]
pub struct GleanerServer {
    tool_router: ToolRouter<Self>,
    orchestrator: Orchestrator,
    config: AppConfig,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl GleanerServer {
    /// Create a new server handler around a ready pipeline.
    pub fn new(orchestrator: Orchestrator, config: AppConfig) -> Self {
        Self { tool_router: Self::tool_router(), orchestrator, config }
    }

    /// Search the web and return consolidated page text.
    #[tool(
        description = "Search the web for a query, fetch the top result pages, and return consolidated text. Results are cached for 24 hours."
    )]
    async fn web_search(&self, params: Parameters<WebSearchParams>) -> Result<CallToolResult, McpError> {
        search_impl(&self.orchestrator, &self.config, params.0).await
    }

    /// Clear cached search results.
    #[tool(
        description = "Clear cached search results. If a query is provided, only that entry is evicted; otherwise all entries are flushed."
    )]
    async fn clear_cache(&self, params: Parameters<ClearCacheParams>) -> Result<CallToolResult, McpError> {
        clear_cache_impl(&self.orchestrator, params.0).await
    }
}

impl ServerHandler for GleanerServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "gleaner".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
