use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, RedisResult};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

use super::CacheLayer;
use crate::config::CacheConfig;
use crate::error::{AppError, Result};

/// Redis-backed cache layer.
///
/// Every command is bounded by `op_timeout` so a slow Redis degrades into a
/// cache error instead of stalling the request.
#[derive(Clone)]
pub struct RedisCacheLayer {
    conn: ConnectionManager,
    ttl: Duration,
    op_timeout: Duration,
}

impl RedisCacheLayer {
    pub fn new(conn: ConnectionManager, ttl: Duration, op_timeout: Duration) -> Self {
        Self {
            conn,
            ttl,
            op_timeout,
        }
    }

    pub async fn connect(config: &CacheConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str())?;
        let conn = ConnectionManager::new(client).await?;

        info!(
            ttl_secs = config.ttl_secs,
            op_timeout_ms = config.op_timeout_ms,
            "Redis cache connected"
        );

        Ok(Self::new(
            conn,
            Duration::from_secs(config.ttl_secs),
            Duration::from_millis(config.op_timeout_ms),
        ))
    }

    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result.map_err(AppError::from),
            Err(_) => Err(AppError::Cache(format!(
                "redis {} timed out after {}ms",
                op,
                self.op_timeout.as_millis()
            ))),
        }
    }
}

#[async_trait]
impl CacheLayer for RedisCacheLayer {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let value = self
            .bounded("GET", conn.get::<_, Option<Vec<u8>>>(key))
            .await?;

        debug!(key, hit = value.is_some(), "cache GET");
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut conn = self.conn.clone();
        self.bounded(
            "SETEX",
            conn.set_ex::<_, _, ()>(key, value, self.ttl.as_secs()),
        )
        .await?;

        debug!(key, ttl_secs = self.ttl.as_secs(), "cache SET");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        self.bounded("DEL", conn.del::<_, ()>(key)).await?;

        debug!(key, "cache DEL");
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let pong: String = self
            .bounded("PING", redis::cmd("PING").query_async(&mut conn))
            .await?;

        if pong == "PONG" {
            Ok(())
        } else {
            Err(AppError::Cache(format!("unexpected PING response: {}", pong)))
        }
    }
}
