//! SQLite-backed cache store.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};

use super::storage::CacheStore;
use super::traits::{CacheError, CacheLookup};

/// Schema for the cache table.
const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS cache_entries (
    cache_key TEXT PRIMARY KEY,
    data BLOB NOT NULL,
    expires_at INTEGER NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_cache_entries_expires
    ON cache_entries(expires_at);
"#;

/// SQLite-based cache storage implementation.
///
/// Expired rows are treated as absent and removed on read.
#[derive(Clone)]
pub struct SqliteStore {
  conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
  /// Open (or create) the cache database at `path`.
  pub fn open(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    Self::with_connection(conn)
  }

  /// In-memory database, discarded on drop.
  #[cfg(test)]
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory cache database: {}", e))?;
    Self::with_connection(conn)
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(Self {
      conn: Arc::new(Mutex::new(conn)),
    })
  }

  /// Run `op` against the connection on the blocking pool.
  async fn blocking<T, F>(&self, op: F) -> Result<T, CacheError>
  where
    T: Send + 'static,
    F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
  {
    let conn = Arc::clone(&self.conn);
    tokio::task::spawn_blocking(move || {
      let conn = conn
        .lock()
        .map_err(|e| CacheError::Backend(format!("Lock poisoned: {}", e)))?;
      op(&conn).map_err(|e| CacheError::Backend(e.to_string()))
    })
    .await
    .map_err(|e| CacheError::Backend(format!("cache task failed: {}", e)))?
  }
}

#[async_trait]
impl CacheStore for SqliteStore {
  async fn get(&self, key: &str) -> Result<CacheLookup, CacheError> {
    let key = key.to_string();
    self
      .blocking(move |conn| {
        let row: Option<(Vec<u8>, i64)> = conn
          .query_row(
            "SELECT data, expires_at FROM cache_entries WHERE cache_key = ?",
            params![key],
            |row| Ok((row.get(0)?, row.get(1)?)),
          )
          .optional()?;

        match row {
          Some((data, expires_at)) if expires_at > Utc::now().timestamp() => {
            Ok(CacheLookup::Hit(data))
          }
          Some(_) => {
            conn.execute("DELETE FROM cache_entries WHERE cache_key = ?", params![key])?;
            Ok(CacheLookup::Miss)
          }
          None => Ok(CacheLookup::Miss),
        }
      })
      .await
  }

  async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
    let key = key.to_string();
    let value = value.to_vec();
    let expires_at = Utc::now().timestamp() + ttl.as_secs() as i64;

    self
      .blocking(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO cache_entries (cache_key, data, expires_at, cached_at)
           VALUES (?, ?, ?, datetime('now'))",
          params![key, value, expires_at],
        )?;
        Ok(())
      })
      .await
  }

  async fn delete(&self, key: &str) -> Result<(), CacheError> {
    let key = key.to_string();
    self
      .blocking(move |conn| {
        conn.execute("DELETE FROM cache_entries WHERE cache_key = ?", params![key])?;
        Ok(())
      })
      .await
  }

  fn backend(&self) -> &'static str {
    "sqlite"
  }
}
