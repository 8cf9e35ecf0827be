//! SQLite-backed cache for consolidated search documents.
//!
//! This module provides a persistent query cache using SQLite with async
//! access via tokio-rusqlite. It supports:
//!
//! - Query keys derived from a SHA-256 digest of the normalized query
//! - Freshness evaluated at read time against a TTL window
//! - Atomic single-statement upserts
//! - Automatic schema migrations and WAL mode for concurrent access

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;

pub use crate::Error;

pub use connection::{CacheDb, DEFAULT_TTL};
pub use entries::CacheEntry;
pub use hash::canonicalize_query;
