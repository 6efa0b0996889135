//! Read-through caching over a key-value store.
//!
//! This module provides a source-agnostic cache-aside mechanism that:
//! - Stores one serialized payload per key with an expiry
//! - Treats store failures as misses and undecodable entries as corruption
//! - Re-derives from the source of truth and writes back on every miss
//!
//! Backends: Redis, SQLite, in-process memory, or disabled.

mod layer;
mod redis_store;
mod sqlite;
mod storage;
#[cfg(test)]
pub(crate) mod testing;
mod traits;

use std::sync::Arc;
use std::time::Duration;

use color_eyre::Result;
use tracing::info;

use crate::config::{CacheBackend, CacheConfig};

use redis_store::RedisStore;
use sqlite::SqliteStore;
use storage::NoopStore;

pub use layer::CacheLayer;
pub use storage::{CacheStore, MemoryStore};
pub use traits::{CacheLookup, CacheSource, Cacheable};

/// Build the configured cache store.
pub fn open_store(config: &CacheConfig) -> Result<Arc<dyn CacheStore>> {
  let store: Arc<dyn CacheStore> = match config.backend {
    CacheBackend::Redis => Arc::new(RedisStore::new(
      &config.host,
      config.port,
      config.db,
      Duration::from_millis(config.timeout_ms),
    )?),
    CacheBackend::Sqlite => Arc::new(SqliteStore::open(&config.sqlite_path)?),
    CacheBackend::Memory => Arc::new(MemoryStore::new()),
    CacheBackend::Disabled => Arc::new(NoopStore),
  };

  Ok(store)
}

/// Build the cache layer for the configured store and TTL.
pub fn build_layer(config: &CacheConfig) -> Result<CacheLayer> {
  let layer = CacheLayer::new(open_store(config)?, Duration::from_secs(config.ttl_secs));

  info!(
    backend = layer.backend(),
    key = %config.key,
    ttl_secs = layer.ttl().as_secs(),
    "Cache layer ready"
  );
  Ok(layer)
}
