//! Cache trait and error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache lock poisoned")]
    Poisoned,
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Key/value store for JSON values with per-entry expiry
///
/// Callers treat any error as a miss; a cache must never be required for
/// correctness.
pub trait Cache: Send + Sync {
    /// Returns the value stored under `key`, or `None` if absent or expired
    fn get_json(&self, key: &str) -> CacheResult<Option<serde_json::Value>>;

    /// Stores `value` under `key` for `ttl`
    fn set_json(&self, key: &str, value: &serde_json::Value, ttl: Duration) -> CacheResult<()>;

    /// Removes `key` if present
    fn remove(&self, key: &str) -> CacheResult<()>;
}

/// Reads a typed value, logging and swallowing any cache failure
pub fn load_cached<T>(cache: &dyn Cache, key: &str) -> Option<T>
where
    T: serde::de::DeserializeOwned,
{
    match cache.get_json(key) {
        Ok(Some(value)) => match serde_json::from_value(value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::debug!("Ignoring malformed cache entry {}: {}", key, e);
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            tracing::warn!("Cache read failed for {}: {}", key, e);
            None
        }
    }
}

/// Writes a typed value, logging and swallowing any cache failure
pub fn store_cached<T>(cache: &dyn Cache, key: &str, value: &T, ttl: Duration)
where
    T: serde::Serialize,
{
    let result = serde_json::to_value(value)
        .map_err(CacheError::from)
        .and_then(|json| cache.set_json(key, &json, ttl));

    if let Err(e) = result {
        tracing::warn!("Cache write failed for {}: {}", key, e);
    }
}
