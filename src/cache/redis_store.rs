//! Redis-backed cache store.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, RedisResult};
use tokio::sync::OnceCell;

use super::storage::CacheStore;
use super::traits::{CacheError, CacheLookup};

/// Redis cache store.
///
/// The connection is established on first use, so the service starts while
/// Redis is down; every operation is bounded by `timeout`. A refused
/// connection fails at once instead of retrying with backoff, so an outage
/// costs each request a failed connect rather than the full timeout.
pub struct RedisStore {
  client: redis::Client,
  conn: OnceCell<ConnectionManager>,
  timeout: Duration,
}

impl RedisStore {
  pub fn new(host: &str, port: u16, db: i64, timeout: Duration) -> Result<Self> {
    let url = format!("redis://{}:{}/{}", host, port, db);
    let client =
      redis::Client::open(url.as_str()).map_err(|e| eyre!("Invalid Redis address {}: {}", url, e))?;

    Ok(Self {
      client,
      conn: OnceCell::new(),
      timeout,
    })
  }

  async fn connection(&self) -> Result<ConnectionManager, CacheError> {
    let conn = self
      .conn
      .get_or_try_init(|| async {
        let config = ConnectionManagerConfig::new()
          .set_number_of_retries(0)
          .set_connection_timeout(self.timeout)
          .set_response_timeout(self.timeout);
        let connect = ConnectionManager::new_with_config(self.client.clone(), config);
        tokio::time::timeout(self.timeout, connect)
          .await
          .map_err(|_| CacheError::Timeout("connect"))?
          .map_err(|e| CacheError::Connection(e.to_string()))
      })
      .await?;

    Ok(conn.clone())
  }

  async fn bounded<T>(
    &self,
    op: &'static str,
    fut: impl Future<Output = RedisResult<T>>,
  ) -> Result<T, CacheError> {
    tokio::time::timeout(self.timeout, fut)
      .await
      .map_err(|_| CacheError::Timeout(op))?
      .map_err(|e| CacheError::Backend(e.to_string()))
  }
}

#[async_trait]
impl CacheStore for RedisStore {
  async fn get(&self, key: &str) -> Result<CacheLookup, CacheError> {
    let mut conn = self.connection().await?;
    let value: Option<Vec<u8>> = self.bounded("get", conn.get(key)).await?;

    Ok(match value {
      Some(value) => CacheLookup::Hit(value),
      None => CacheLookup::Miss,
    })
  }

  async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
    let mut conn = self.connection().await?;
    self
      .bounded("set", conn.set_ex::<_, _, ()>(key, value, ttl.as_secs()))
      .await
  }

  async fn delete(&self, key: &str) -> Result<(), CacheError> {
    let mut conn = self.connection().await?;
    self.bounded("delete", conn.del::<_, ()>(key)).await
  }

  fn backend(&self) -> &'static str {
    "redis"
  }
}
