//! Unified error types for gleaner.
//!
//! Every variant renders with a stable upper-case code prefix so callers on
//! any surface can inspect the cause without parsing free text.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the search pipeline and its surfaces.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., zero result count).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Startup configuration problem (e.g., cache file cannot be opened).
    #[error("CONFIG_ERROR: {0}")]
    Config(String),

    /// The discovery request failed.
    #[error("DISCOVERY_FAILED: {0}")]
    Discovery(String),

    /// Discovery succeeded but produced no candidate pages.
    #[error("NO_RESULTS: {0}")]
    NoResults(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Fetch timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// HTTP error response or transport failure.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// Content extraction failed.
    #[error("EXTRACT_FAILED: {0}")]
    ExtractFailed(String),

    /// The operation was cancelled by the caller.
    #[error("CANCELLED: {0}")]
    Cancelled(String),

    /// Every page failed or produced blank text.
    #[error("ALL_SOURCES_FAILED: {0}")]
    AllSourcesFailed(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A persisted row violates the cache invariants.
    #[error("CACHE_CORRUPT: {0}")]
    CorruptEntry(String),
}

impl Error {
    /// Stable code identifying the failure class.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "INVALID_INPUT",
            Error::Config(_) => "CONFIG_ERROR",
            Error::Discovery(_) => "DISCOVERY_FAILED",
            Error::NoResults(_) => "NO_RESULTS",
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::FetchTimeout(_) => "FETCH_TIMEOUT",
            Error::FetchTooLarge(_) => "FETCH_TOO_LARGE",
            Error::HttpError(_) => "HTTP_ERROR",
            Error::ExtractFailed(_) => "EXTRACT_FAILED",
            Error::Cancelled(_) => "CANCELLED",
            Error::AllSourcesFailed(_) => "ALL_SOURCES_FAILED",
            Error::Database(_) | Error::MigrationFailed(_) => "CACHE_ERROR",
            Error::CorruptEntry(_) => "CACHE_CORRUPT",
        }
    }

    /// Whether the failure originates in the cache store.
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Database(_) | Error::MigrationFailed(_) | Error::CorruptEntry(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::InvalidInput(_) | Error::InvalidUrl(_) => -32602,
            Error::Config(_) => -32603,
            Error::Discovery(_) => -32001,
            Error::NoResults(_) => -32002,
            Error::AllSourcesFailed(_) => -32003,
            Error::FetchTimeout(_) | Error::FetchTooLarge(_) | Error::HttpError(_) | Error::ExtractFailed(_) => {
                -32004
            }
            Error::Cancelled(_) => -32800,
            Error::Database(_) | Error::MigrationFailed(_) | Error::CorruptEntry(_) => -32005,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}
