//! Process-local cache

use crate::cache::traits::{Cache, CacheError, CacheResult};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: serde_json::Value,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_stale(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// In-memory cache that lives as long as the process
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held, including stale ones
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Cache for MemoryCache {
    fn get_json(&self, key: &str) -> CacheResult<Option<serde_json::Value>> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;

        match entries.get(key) {
            Some(entry) if entry.is_stale() => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    fn set_json(&self, key: &str, value: &serde_json::Value, ttl: Duration) -> CacheResult<()> {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::zero());
        let entry = CacheEntry {
            value: value.clone(),
            expires_at: Utc::now() + ttl,
        };

        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        entries.insert(key.to_string(), entry);
        Ok(())
    }

    fn remove(&self, key: &str) -> CacheResult<()> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}
