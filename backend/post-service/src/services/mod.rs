/// Business logic layer for post-service
///
/// - Post service: transactional create, cached reads, related-post
///   enrichment, update with cache invalidation and re-indexing
pub mod posts;

pub use posts::{DependencyHealth, PostService, DEFAULT_RELATED_LIMIT};
