//! Cache store trait and the in-process implementations.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::traits::{CacheError, CacheLookup};

/// Trait for key-value cache backends with per-key expiry.
#[async_trait]
pub trait CacheStore: Send + Sync {
  /// Read the raw value stored under `key`.
  async fn get(&self, key: &str) -> Result<CacheLookup, CacheError>;

  /// Store `value` under `key`, expiring after `ttl`.
  async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError>;

  /// Remove `key`. Removing an absent key is not an error.
  async fn delete(&self, key: &str) -> Result<(), CacheError>;

  /// Backend name for log fields.
  fn backend(&self) -> &'static str;
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStore;

#[async_trait]
impl CacheStore for NoopStore {
  async fn get(&self, _key: &str) -> Result<CacheLookup, CacheError> {
    Ok(CacheLookup::Miss) // Always miss
  }

  async fn set(&self, _key: &str, _value: &[u8], _ttl: Duration) -> Result<(), CacheError> {
    Ok(()) // Discard
  }

  async fn delete(&self, _key: &str) -> Result<(), CacheError> {
    Ok(())
  }

  fn backend(&self) -> &'static str {
    "disabled"
  }
}

/// In-process store with expiry, for single-instance deployments.
#[derive(Default)]
pub struct MemoryStore {
  entries: Mutex<HashMap<String, (Vec<u8>, Instant)>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl CacheStore for MemoryStore {
  async fn get(&self, key: &str) -> Result<CacheLookup, CacheError> {
    let mut entries = self
      .entries
      .lock()
      .map_err(|e| CacheError::Backend(format!("Lock poisoned: {}", e)))?;

    match entries.get(key) {
      Some((value, expires_at)) if Instant::now() < *expires_at => Ok(CacheLookup::Hit(value.clone())),
      Some(_) => {
        entries.remove(key);
        Ok(CacheLookup::Miss)
      }
      None => Ok(CacheLookup::Miss),
    }
  }

  async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
    let mut entries = self
      .entries
      .lock()
      .map_err(|e| CacheError::Backend(format!("Lock poisoned: {}", e)))?;

    entries.insert(key.to_string(), (value.to_vec(), Instant::now() + ttl));
    Ok(())
  }

  async fn delete(&self, key: &str) -> Result<(), CacheError> {
    let mut entries = self
      .entries
      .lock()
      .map_err(|e| CacheError::Backend(format!("Lock poisoned: {}", e)))?;

    entries.remove(key);
    Ok(())
  }

  fn backend(&self) -> &'static str {
    "memory"
  }
}
