//! MCP tool implementations.
//!
//! This module contains all tools exposed by the gleaner MCP server.

pub mod clear_cache;
pub mod web_search;

pub use clear_cache::{ClearCacheParams, clear_cache_impl};
pub use web_search::{WebSearchParams, search_impl};
