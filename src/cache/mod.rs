//! Cache module for Site-Digest
//!
//! A small TTL key/value store used to avoid re-resolving sitemaps for the
//! same site. Two backends are provided: `MemoryCache` for a single process
//! and `SqliteCache` for reuse across runs.

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryCache;
pub use schema::{initialize_schema, SCHEMA_SQL};
pub use sqlite::SqliteCache;
pub use traits::{load_cached, store_cached, Cache, CacheError, CacheResult};
