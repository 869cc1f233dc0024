/// Cache layer: opportunistic read acceleration with bounded staleness.
///
/// Values are opaque byte blobs; `PostService` owns (de)serialization.
/// The cache is never authoritative and misses are never cached.
pub mod redis_cache;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::PostId;

pub use redis_cache::RedisCacheLayer;

/// Cache key for an individual post snapshot.
pub fn post_cache_key(id: PostId) -> String {
    format!("post:{}", id)
}

#[async_trait]
pub trait CacheLayer: Send + Sync {
    /// `Ok(None)` on a miss; transport failures are `Err`.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store with the configured TTL, overwriting any previous value.
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Remove a key. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    async fn ping(&self) -> Result<()>;
}
