/// Search index: best-effort denormalized index for text and tag discovery.
///
/// Convergence with the record store is eventual. A missing or stale document
/// degrades search results but never blocks a write.
pub mod elasticsearch;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{PostId, SearchDocument};

pub use self::elasticsearch::{ElasticsearchError, ElasticsearchIndex};

#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Create the index and its mapping if absent. Idempotent.
    async fn ensure_index(&self) -> Result<()>;

    /// Upsert a document keyed by its post id.
    async fn index_document(&self, doc: &SearchDocument) -> Result<()>;

    /// Multi-field match over title and content.
    async fn search_full_text(&self, query: &str) -> Result<Vec<SearchDocument>>;

    /// Up to `limit` documents sharing any of `tags`, excluding `exclude_id`.
    /// An empty tag list yields an empty result without querying.
    async fn find_related(
        &self,
        exclude_id: PostId,
        tags: &[String],
        limit: usize,
    ) -> Result<Vec<SearchDocument>>;

    async fn ping(&self) -> Result<()>;
}
