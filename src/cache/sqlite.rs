//! SQLite cache implementation

use crate::cache::schema::initialize_schema;
use crate::cache::traits::{Cache, CacheError, CacheResult};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// Fixed-width RFC 3339 so stored timestamps compare correctly as text
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Cache persisted to an SQLite file, shared across runs
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Opens (or creates) the cache database at `path`
    pub fn new(path: &Path) -> CacheResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory cache database
    pub fn new_in_memory() -> CacheResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Deletes every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> CacheResult<usize> {
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        let removed = conn.execute(
            "DELETE FROM cache_entries WHERE expires_at <= ?1",
            params![timestamp(Utc::now())],
        )?;
        Ok(removed)
    }
}

impl Cache for SqliteCache {
    fn get_json(&self, key: &str) -> CacheResult<Option<serde_json::Value>> {
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;

        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT value, expires_at FROM cache_entries WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((value, expires_at)) = row else {
            return Ok(None);
        };

        let expired = DateTime::parse_from_rfc3339(&expires_at)
            .map(|t| t.with_timezone(&Utc) <= Utc::now())
            .unwrap_or(true);

        if expired {
            conn.execute("DELETE FROM cache_entries WHERE key = ?1", params![key])?;
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&value)?))
    }

    fn set_json(&self, key: &str, value: &serde_json::Value, ttl: Duration) -> CacheResult<()> {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::zero());
        let expires_at = timestamp(Utc::now() + ttl);
        let text = serde_json::to_string(value)?;

        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        conn.execute(
            "INSERT INTO cache_entries (key, value, expires_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
            params![key, text, expires_at],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> CacheResult<()> {
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        conn.execute("DELETE FROM cache_entries WHERE key = ?1", params![key])?;
        Ok(())
    }
}
