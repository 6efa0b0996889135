//! Core traits and types for the caching system.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Trait for payloads that can be cached as a single serialized entry.
pub trait Cacheable: Send + Sync + Serialize + DeserializeOwned {
  /// Payload type name used in log fields (e.g., "row_records")
  fn entity_type() -> &'static str;

  /// True when a decoded payload carries nothing worth serving.
  ///
  /// A vacant payload read from the store is treated like corruption.
  fn is_vacant(&self) -> bool {
    false
  }
}

/// Outcome of a successful store read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
  /// Raw serialized value stored under the key
  Hit(Vec<u8>),
  /// Key absent or expired
  Miss,
}

/// Errors raised by a cache store backend.
///
/// The cache layer absorbs these; they never fail a read.
#[derive(Debug, Error)]
pub enum CacheError {
  #[error("cache connection failed: {0}")]
  Connection(String),

  #[error("cache operation '{0}' timed out")]
  Timeout(&'static str),

  #[error("cache backend error: {0}")]
  Backend(String),
}

/// Result from a read-through operation, including where the data came from.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
}

impl<T> CacheResult<T> {
  /// Data re-derived from the source of truth.
  pub fn from_source(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Source,
    }
  }

  /// Data decoded from the cache store.
  pub fn from_store(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Store,
    }
  }
}

/// Indicates where read-through data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Served from the cache store
  Store,
  /// Re-derived from the source of truth
  Source,
}
