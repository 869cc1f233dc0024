/// Post service - coordinates the record store, cache and search index
use crate::cache::{post_cache_key, CacheLayer};
use crate::db::{run_in_transaction, RecordStore};
use crate::error::{AppError, Result};
use crate::metrics::{POST_CACHE_EVENTS, SOFT_FAILURES_TOTAL};
use crate::models::{ActivityAction, Post, PostId, PostInput, PostWithRelated, SearchDocument};
use crate::search::SearchIndex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Related posts returned with an enriched read unless configured otherwise.
pub const DEFAULT_RELATED_LIMIT: usize = 5;

/// Outcome of probing each dependency, used by the readiness endpoint.
#[derive(Debug, Clone)]
pub struct DependencyHealth {
    pub store: std::result::Result<(), String>,
    pub cache: std::result::Result<(), String>,
    pub index: std::result::Result<(), String>,
}

#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn RecordStore>,
    cache: Arc<dyn CacheLayer>,
    index: Arc<dyn SearchIndex>,
    related_limit: usize,
}

impl PostService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        cache: Arc<dyn CacheLayer>,
        index: Arc<dyn SearchIndex>,
    ) -> Self {
        Self {
            store,
            cache,
            index,
            related_limit: DEFAULT_RELATED_LIMIT,
        }
    }

    pub fn with_related_limit(mut self, limit: usize) -> Self {
        self.related_limit = limit;
        self
    }

    /// Create a post and its `new_post` activity entry atomically, then index it.
    pub async fn create_post(&self, input: PostInput) -> Result<Post> {
        let post = run_in_transaction(self.store.as_ref(), move |tx| {
            Box::pin(async move {
                let post = tx.insert_post(&input).await?;
                tx.append_activity(ActivityAction::NewPost, post.id).await?;
                Ok::<_, AppError>(post)
            })
        })
        .await
        .map_err(|err| match err {
            AppError::Validation(_) => err,
            other => AppError::Transaction(other.to_string()),
        })?;

        info!(post_id = post.id, "post created");

        discard_soft_failure(
            "search",
            "index",
            post.id,
            self.index.index_document(&SearchDocument::from(&post)).await,
        );

        Ok(post)
    }

    /// Get a post by ID, reading through the cache.
    pub async fn get_post(&self, post_id: PostId) -> Result<Post> {
        let key = post_cache_key(post_id);

        match self.cache.get(&key).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<Post>(&bytes) {
                Ok(post) => {
                    POST_CACHE_EVENTS.with_label_values(&["hit"]).inc();
                    debug!(post_id, "post cache hit");
                    return Ok(post);
                }
                Err(err) => {
                    POST_CACHE_EVENTS.with_label_values(&["error"]).inc();
                    warn!(post_id, error = %err, "undecodable post cache entry, reloading");
                }
            },
            Ok(None) => {
                POST_CACHE_EVENTS.with_label_values(&["miss"]).inc();
            }
            Err(err) => {
                POST_CACHE_EVENTS.with_label_values(&["error"]).inc();
                discard_soft_failure::<()>("cache", "get", post_id, Err(err));
            }
        }

        let post = self.store.get_post(post_id).await?;
        self.populate_cache(&post).await;

        Ok(post)
    }

    /// Get a post together with posts sharing at least one of its tags.
    ///
    /// Index failures only empty the related list.
    pub async fn get_post_with_related(&self, post_id: PostId) -> Result<PostWithRelated> {
        let post = self.get_post(post_id).await?;

        let related_posts = discard_soft_failure(
            "search",
            "find_related",
            post_id,
            self.index
                .find_related(post.id, &post.tags, self.related_limit)
                .await,
        )
        .unwrap_or_default();

        Ok(PostWithRelated {
            post,
            related_posts,
        })
    }

    /// Replace a post's fields, invalidate its cache entry and re-index it.
    pub async fn update_post(&self, post_id: PostId, input: PostInput) -> Result<Post> {
        let updated = self.store.update_post(post_id, &input).await?;
        info!(post_id, "post updated");

        discard_soft_failure(
            "cache",
            "delete",
            post_id,
            self.cache.delete(&post_cache_key(post_id)).await,
        );

        discard_soft_failure(
            "search",
            "index",
            post_id,
            self.index
                .index_document(&SearchDocument::from(&updated))
                .await,
        );

        self.store.get_post(post_id).await
    }

    /// Posts carrying `tag`, newest first. Served by the record store.
    pub async fn search_by_tag(&self, tag: &str) -> Result<Vec<Post>> {
        self.store.search_by_tag(tag).await
    }

    /// Full-text search over title and content. Index errors are returned.
    pub async fn search_full_text(&self, query: &str) -> Result<Vec<SearchDocument>> {
        self.index.search_full_text(query).await
    }

    pub async fn dependency_health(&self) -> DependencyHealth {
        let (store, cache, index) =
            tokio::join!(self.store.ping(), self.cache.ping(), self.index.ping());

        DependencyHealth {
            store: store.map_err(|e| e.to_string()),
            cache: cache.map_err(|e| e.to_string()),
            index: index.map_err(|e| e.to_string()),
        }
    }

    async fn populate_cache(&self, post: &Post) {
        let bytes = match serde_json::to_vec(post) {
            Ok(bytes) => bytes,
            Err(err) => {
                discard_soft_failure::<()>("cache", "encode", post.id, Err(err.into()));
                return;
            }
        };

        discard_soft_failure(
            "cache",
            "set",
            post.id,
            self.cache.set(&post_cache_key(post.id), &bytes).await,
        );
    }
}

/// The single point where cache and index failures are dropped.
///
/// Logs the error, counts it, and hands back the value on success.
pub(crate) fn discard_soft_failure<T>(
    dependency: &'static str,
    operation: &'static str,
    post_id: PostId,
    result: Result<T>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            SOFT_FAILURES_TOTAL
                .with_label_values(&[dependency, operation])
                .inc();
            warn!(
                post_id,
                dependency,
                operation,
                error = %err,
                "ignoring {} failure",
                dependency
            );
            None
        }
    }
}
