//! Test doubles for cache stores.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::storage::CacheStore;
use super::traits::{CacheError, CacheLookup};

/// Map-backed store that counts every call. Ignores TTLs.
#[derive(Default)]
pub struct RecordingStore {
  entries: Mutex<HashMap<String, Vec<u8>>>,
  gets: AtomicUsize,
  sets: AtomicUsize,
  deletes: AtomicUsize,
}

impl RecordingStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Place a raw value without counting it as a set.
  pub fn seed(&self, key: &str, value: &[u8]) {
    self
      .entries
      .lock()
      .unwrap()
      .insert(key.to_string(), value.to_vec());
  }

  pub fn value(&self, key: &str) -> Option<Vec<u8>> {
    self.entries.lock().unwrap().get(key).cloned()
  }

  pub fn gets(&self) -> usize {
    self.gets.load(Ordering::SeqCst)
  }

  pub fn sets(&self) -> usize {
    self.sets.load(Ordering::SeqCst)
  }

  pub fn deletes(&self) -> usize {
    self.deletes.load(Ordering::SeqCst)
  }

  pub fn calls(&self) -> usize {
    self.gets() + self.sets() + self.deletes()
  }
}

#[async_trait]
impl CacheStore for RecordingStore {
  async fn get(&self, key: &str) -> Result<CacheLookup, CacheError> {
    self.gets.fetch_add(1, Ordering::SeqCst);
    Ok(match self.value(key) {
      Some(value) => CacheLookup::Hit(value),
      None => CacheLookup::Miss,
    })
  }

  async fn set(&self, key: &str, value: &[u8], _ttl: Duration) -> Result<(), CacheError> {
    self.sets.fetch_add(1, Ordering::SeqCst);
    self.seed(key, value);
    Ok(())
  }

  async fn delete(&self, key: &str) -> Result<(), CacheError> {
    self.deletes.fetch_add(1, Ordering::SeqCst);
    self.entries.lock().unwrap().remove(key);
    Ok(())
  }

  fn backend(&self) -> &'static str {
    "recording"
  }
}

/// Store whose every operation fails as if the server were unreachable.
#[derive(Default)]
pub struct FailingStore {
  gets: AtomicUsize,
  sets: AtomicUsize,
}

impl FailingStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn gets(&self) -> usize {
    self.gets.load(Ordering::SeqCst)
  }

  pub fn sets(&self) -> usize {
    self.sets.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl CacheStore for FailingStore {
  async fn get(&self, _key: &str) -> Result<CacheLookup, CacheError> {
    self.gets.fetch_add(1, Ordering::SeqCst);
    Err(CacheError::Connection("connection refused".into()))
  }

  async fn set(&self, _key: &str, _value: &[u8], _ttl: Duration) -> Result<(), CacheError> {
    self.sets.fetch_add(1, Ordering::SeqCst);
    Err(CacheError::Connection("connection refused".into()))
  }

  async fn delete(&self, _key: &str) -> Result<(), CacheError> {
    Err(CacheError::Connection("connection refused".into()))
  }

  fn backend(&self) -> &'static str {
    "failing"
  }
}

/// Store that always returns the same raw value and rejects every write.
pub struct UndeletableStore {
  raw: Vec<u8>,
  sets: AtomicUsize,
  deletes: AtomicUsize,
}

impl UndeletableStore {
  pub fn new(raw: &[u8]) -> Self {
    Self {
      raw: raw.to_vec(),
      sets: AtomicUsize::new(0),
      deletes: AtomicUsize::new(0),
    }
  }

  pub fn sets(&self) -> usize {
    self.sets.load(Ordering::SeqCst)
  }

  pub fn deletes(&self) -> usize {
    self.deletes.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl CacheStore for UndeletableStore {
  async fn get(&self, _key: &str) -> Result<CacheLookup, CacheError> {
    Ok(CacheLookup::Hit(self.raw.clone()))
  }

  async fn set(&self, _key: &str, _value: &[u8], _ttl: Duration) -> Result<(), CacheError> {
    self.sets.fetch_add(1, Ordering::SeqCst);
    Err(CacheError::Backend("READONLY replica".into()))
  }

  async fn delete(&self, _key: &str) -> Result<(), CacheError> {
    self.deletes.fetch_add(1, Ordering::SeqCst);
    Err(CacheError::Backend("READONLY replica".into()))
  }

  fn backend(&self) -> &'static str {
    "undeletable"
  }
}
