//! Cache layer that orchestrates cache-aside reads over a source of truth.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::storage::CacheStore;
use super::traits::{CacheError, CacheLookup, CacheResult, Cacheable};

/// Cache layer that manages caching logic and source fetching.
///
/// Store failures never surface from this layer: an unreachable store is a
/// miss, an undecodable entry is deleted and re-derived, and a failed
/// write-back is logged. Only the fetcher's error reaches the caller.
pub struct CacheLayer {
  store: Arc<dyn CacheStore>,
  /// Expiry applied on every write-back
  ttl: Duration,
}

impl CacheLayer {
  /// Create a new cache layer with the given storage backend.
  pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
    Self { store, ttl }
  }

  pub fn ttl(&self) -> Duration {
    self.ttl
  }

  pub fn backend(&self) -> &'static str {
    self.store.backend()
  }

  /// Fetch a payload with cache-aside strategy.
  ///
  /// 1. Read the key - any store error counts as a miss
  /// 2. On a decodable, non-vacant value, return it without calling `fetcher`
  /// 3. On an undecodable value, delete the key (best effort)
  /// 4. Fetch from source, write back with the TTL (best effort)
  ///
  /// The write-back is skipped when the read could not reach the store.
  /// Concurrent misses may each call `fetcher`; the last write-back wins.
  pub async fn read_through<T, E, F, Fut>(&self, key: &str, fetcher: F) -> Result<CacheResult<T>, E>
  where
    T: Cacheable,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
  {
    let reachable = match self.lookup::<T>(key).await {
      Entry::Cached(cached) => {
        info!(key, entity = T::entity_type(), "Served from cache");
        return Ok(CacheResult::from_store(cached));
      }
      Entry::Missing => true,
      Entry::Unreachable => false,
    };

    let data = fetcher().await?;
    if reachable {
      self.write_back(key, &data).await;
    } else {
      debug!(key, "Store unreachable, skipping write-back");
    }

    Ok(CacheResult::from_source(data))
  }

  /// Read and decode the entry at `key`.
  async fn lookup<T: Cacheable>(&self, key: &str) -> Entry<T> {
    debug!(key, backend = self.backend(), "Reading cache entry");

    let raw = match self.store.get(key).await {
      Ok(CacheLookup::Hit(raw)) if !raw.is_empty() => raw,
      Ok(_) => {
        debug!(key, "Cache miss");
        return Entry::Missing;
      }
      Err(e @ (CacheError::Connection(_) | CacheError::Timeout(_))) => {
        error!(key, error = %e, "Cache unreachable, falling back to source");
        return Entry::Unreachable;
      }
      Err(e) => {
        error!(key, error = %e, "Cache read failed, falling back to source");
        return Entry::Missing;
      }
    };

    match serde_json::from_slice::<T>(&raw) {
      Ok(data) if !data.is_vacant() => {
        debug!(key, bytes = raw.len(), "Cache entry decoded");
        Entry::Cached(data)
      }
      Ok(_) => {
        warn!(key, "Cache entry is empty, treating as corrupted");
        self.evict(key).await;
        Entry::Missing
      }
      Err(e) => {
        error!(key, error = %e, "Cache entry could not be decoded, treating as corrupted");
        self.evict(key).await;
        Entry::Missing
      }
    }
  }

  async fn evict(&self, key: &str) {
    match self.store.delete(key).await {
      Ok(()) => debug!(key, "Corrupted cache entry deleted"),
      Err(e) => error!(key, error = %e, "Failed to delete corrupted cache entry"),
    }
  }

  async fn write_back<T: Cacheable>(&self, key: &str, data: &T) {
    let serialized = match serde_json::to_vec(data) {
      Ok(bytes) => bytes,
      Err(e) => {
        error!(key, error = %e, "Failed to serialize payload for cache");
        return;
      }
    };

    match self.store.set(key, &serialized, self.ttl).await {
      Ok(()) => debug!(key, ttl_secs = self.ttl.as_secs(), "Cache entry stored"),
      Err(e) => error!(key, error = %e, "Failed to store cache entry"),
    }
  }
}

/// What a store read yielded for the layer.
enum Entry<T> {
  Cached(T),
  /// Absent, expired, corrupted or unreadable; the source must be used
  Missing,
  /// The store could not be reached at all
  Unreachable,
}

impl Clone for CacheLayer {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      ttl: self.ttl,
    }
  }
}
