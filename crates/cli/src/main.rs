//! gleaner command-line tool.
//!
//! Runs searches against the shared cache, manages cache entries, and serves
//! the REST API.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use gleaner_client::Orchestrator;
use gleaner_core::{AppConfig, SearchEngine};
use gleaner_server::ApiState;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Search the web, fetch the top pages, and cache the consolidated text.
#[derive(Parser, Debug)]
#[command(name = "gleaner", version, about)]
struct Cli {
    /// Cache database path (overrides GLEANER_DB_PATH).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Discovery engine: google or duckduckgo.
    #[arg(long, global = true)]
    engine: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search for a query and print the consolidated document.
    Search {
        /// Query text.
        query: String,

        /// Number of result pages to fetch.
        #[arg(short, long)]
        count: Option<usize>,

        /// Bypass the cache.
        #[arg(short, long)]
        force: bool,

        /// Print the outcome as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Evict one query from the cache, or everything when no query is given.
    ClearCache {
        /// Query to evict.
        query: Option<String>,
    },

    /// Delete stale cache entries.
    Prune,

    /// Serve the REST API.
    Serve {
        /// Listen address (overrides GLEANER_HTTP_ADDR).
        #[arg(long)]
        addr: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gleaner=info,warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut config = AppConfig::load()?;
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(engine) = &cli.engine {
        config.engine = engine.parse::<SearchEngine>()?;
    }
    config.validate()?;
    Ok(config)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let orchestrator = Orchestrator::from_config(&config).await?;

    let result = match cli.command {
        Command::Search { query, count, force, json } => {
            let cancel = CancellationToken::new();
            let trigger = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("received Ctrl+C, cancelling search");
                    trigger.cancel();
                }
            });

            let count = count.map_or(config.default_count, |c| c.min(config.max_count));
            search(&orchestrator, &query, count, force, json, &cancel).await
        }
        Command::ClearCache { query } => {
            let query = query.unwrap_or_default();
            let removed = orchestrator.evict(&query).await?;
            if query.is_empty() {
                println!("all cache entries cleared ({removed} removed)");
            } else {
                println!("cache entry for {query:?} cleared ({removed} removed)");
            }
            Ok(())
        }
        Command::Prune => {
            let removed = orchestrator.prune().await?;
            println!("{removed} stale entries removed");
            Ok(())
        }
        Command::Serve { addr } => {
            let addr = addr.unwrap_or_else(|| config.http_addr.clone());
            gleaner_server::serve(&addr, ApiState::new(orchestrator.clone(), config)).await
        }
    };

    orchestrator.shutdown().await?;
    result
}

async fn search(
    orchestrator: &Orchestrator, query: &str, count: usize, force: bool, json: bool, cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let outcome = orchestrator.run_with_cancel(query, count, force, cancel).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        eprintln!("[results: {}, from_cache: {}]", outcome.result_count, outcome.from_cache);
        println!("{}", outcome.content);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_search() {
        let cli = Cli::try_parse_from(["gleaner", "search", "golang concurrency", "-c", "3", "--force"]).unwrap();
        match cli.command {
            Command::Search { query, count, force, json } => {
                assert_eq!(query, "golang concurrency");
                assert_eq!(count, Some(3));
                assert!(force);
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_clear_cache_optional_query() {
        let cli = Cli::try_parse_from(["gleaner", "clear-cache"]).unwrap();
        assert!(matches!(cli.command, Command::ClearCache { query: None }));

        let cli = Cli::try_parse_from(["gleaner", "clear-cache", "rust"]).unwrap();
        assert!(matches!(cli.command, Command::ClearCache { query: Some(q) } if q == "rust"));
    }

    #[test]
    fn test_global_overrides() {
        let cli = Cli::try_parse_from(["gleaner", "prune", "--db", "/tmp/x.sqlite", "--engine", "google"]).unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.sqlite")));
        assert_eq!(cli.engine.as_deref(), Some("google"));
    }

    #[test]
    fn test_search_requires_query() {
        assert!(Cli::try_parse_from(["gleaner", "search"]).is_err());
    }
}
