//! gleaner MCP server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use anyhow::Result;
use gleaner_client::Orchestrator;
use gleaner_core::AppConfig;
use gleaner_server::GleanerServer;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let orchestrator = Orchestrator::from_config(&config).await?;

    tracing::info!("Starting gleaner MCP server on stdio transport");

    let handler = GleanerServer::new(orchestrator.clone(), config);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    orchestrator.shutdown().await?;

    Ok(())
}
