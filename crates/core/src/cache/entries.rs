//! Query cache reads, upserts, and eviction.
//!
//! Rows never expire actively. Freshness is decided at read time by comparing
//! the row's `updated_at` against the handle's TTL, so a stale row stays on
//! disk until it is overwritten, evicted, or purged.

use super::connection::CacheDb;
use crate::Error;
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A persisted consolidated document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub content: String,
    /// Number of sections in `content`, when the writer recorded it.
    pub result_count: Option<u64>,
    pub updated_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Whether the entry is still inside `ttl` at `now`.
    ///
    /// Timestamps in the future (clock skew) count as fresh.
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        match (now - self.updated_at).to_std() {
            Ok(age) => age <= ttl,
            Err(_) => true,
        }
    }
}

/// Fixed-width UTC timestamps so lexical order matches chronological order.
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl CacheDb {
    /// Get fresh cached content for a key.
    ///
    /// Returns None when the key is absent or its entry is older than the TTL.
    pub async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.get_fresh(key).await?.map(|entry| entry.content))
    }

    /// Get the fresh entry for a key, including its recorded result count.
    pub async fn get_fresh(&self, key: &str) -> Result<Option<CacheEntry>, Error> {
        let Some(entry) = self.entry(key).await? else {
            return Ok(None);
        };

        if entry.is_fresh(self.ttl, Utc::now()) {
            Ok(Some(entry))
        } else {
            tracing::debug!(key, updated_at = %entry.updated_at, "cache entry is stale");
            Ok(None)
        }
    }

    /// Get the raw entry for a key, fresh or not.
    ///
    /// # Errors
    ///
    /// Returns `Error::CorruptEntry` if the stored timestamp cannot be parsed.
    pub async fn entry(&self, key: &str) -> Result<Option<CacheEntry>, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                let mut stmt = conn.prepare("SELECT content, result_count, updated_at FROM query_cache WHERE query_hash = ?1")?;

                let row = stmt.query_row(params![key], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, Option<i64>>(1)?, row.get::<_, String>(2)?))
                });

                let (content, result_count, updated_at) = match row {
                    Ok(row) => row,
                    Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                    Err(e) => return Err(e.into()),
                };

                let updated_at = DateTime::parse_from_rfc3339(&updated_at).map_err(|e| {
                    tracing::error!(key = %key, raw = %updated_at, "corrupted cache timestamp: {e}");
                    Error::CorruptEntry(format!("invalid updated_at for {key}: {e}"))
                })?;

                Ok(Some(CacheEntry {
                    key,
                    content,
                    result_count: result_count.and_then(|c| u64::try_from(c).ok()),
                    updated_at: updated_at.with_timezone(&Utc),
                }))
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or overwrite the content for a key, refreshing its timestamp.
    ///
    /// A single `INSERT .. ON CONFLICT DO UPDATE` statement, so concurrent
    /// writers to the same key never observe a partial row.
    pub async fn set(&self, key: &str, content: &str) -> Result<(), Error> {
        self.upsert(key, content, None, Utc::now()).await
    }

    /// Like [`CacheDb::set`], also recording how many sections `content` holds.
    pub async fn set_with_count(&self, key: &str, content: &str, result_count: u64) -> Result<(), Error> {
        if result_count == 0 {
            return Err(Error::InvalidInput("result count must be greater than 0".into()));
        }
        self.upsert(key, content, Some(result_count), Utc::now()).await
    }

    pub(crate) async fn upsert(
        &self, key: &str, content: &str, result_count: Option<u64>, at: DateTime<Utc>,
    ) -> Result<(), Error> {
        if key.is_empty() {
            return Err(Error::InvalidInput("cache key cannot be empty".into()));
        }
        if content.is_empty() {
            return Err(Error::InvalidInput("cached content cannot be empty".into()));
        }

        let key = key.to_string();
        let content = content.to_string();
        let result_count = result_count.map(i64::try_from).transpose().map_err(|e| Error::InvalidInput(e.to_string()))?;
        let updated_at = format_timestamp(at);

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO query_cache (query_hash, content, result_count, updated_at)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(query_hash) DO UPDATE SET
                        content = excluded.content,
                        result_count = excluded.result_count,
                        updated_at = excluded.updated_at",
                    params![key, content, result_count, updated_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete the entry for `key`, or every entry when `key` is empty.
    ///
    /// Returns the number of deleted rows; deleting nothing is not an error.
    pub async fn evict(&self, key: &str) -> Result<u64, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = if key.is_empty() {
                    conn.execute("DELETE FROM query_cache", [])?
                } else {
                    conn.execute("DELETE FROM query_cache WHERE query_hash = ?1", params![key])?
                };
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every entry older than the TTL.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_stale(&self) -> Result<u64, Error> {
        let ttl = TimeDelta::from_std(self.ttl).map_err(|e| Error::InvalidInput(format!("ttl out of range: {e}")))?;
        let cutoff = format_timestamp(Utc::now() - ttl);
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM query_cache WHERE updated_at < ?1", params![cutoff])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of stored rows, fresh or stale.
    pub async fn len(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM query_cache", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Whether the store holds no rows.
    pub async fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.len().await? == 0)
    }
}
