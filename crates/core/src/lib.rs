//! Core types and shared functionality for gleaner.
//!
//! This crate provides:
//! - Query cache with SQLite backend and read-time TTL
//! - Query normalization into cache keys
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, CacheEntry, canonicalize_query};
pub use config::{AppConfig, ConfigError, SearchEngine};
pub use error::Error;
