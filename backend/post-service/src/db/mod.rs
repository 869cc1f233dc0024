/// Record store: the durable system-of-record for posts and the activity log.
///
/// `RecordStore` is the seam `PostService` depends on; `PgRecordStore` is the
/// PostgreSQL implementation. Writes that must be atomic go through a
/// `StoreTransaction`, either directly or via [`run_in_transaction`].
pub mod post_repo;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::warn;

use crate::error::Result;
use crate::models::{ActivityAction, ActivityLogEntry, Post, PostId, PostInput};

pub use post_repo::PgRecordStore;

/// An open record-store transaction.
///
/// Dropping a transaction without calling [`StoreTransaction::commit`] rolls it back.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Validate and insert a post; id and timestamps are assigned by the store.
    async fn insert_post(&mut self, input: &PostInput) -> Result<Post>;

    /// Append an activity entry referencing `post_id`.
    async fn append_activity(
        &mut self,
        action: ActivityAction,
        post_id: PostId,
    ) -> Result<ActivityLogEntry>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Open a new transaction.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>>;

    /// Replace title, content and tags of an existing post.
    async fn update_post(&self, id: PostId, input: &PostInput) -> Result<Post>;

    async fn get_post(&self, id: PostId) -> Result<Post>;

    /// Posts whose tag set contains `tag`, newest id first.
    async fn search_by_tag(&self, tag: &str) -> Result<Vec<Post>>;

    /// Activity entries referencing `post_id`, oldest first.
    async fn activity_for_post(&self, post_id: PostId) -> Result<Vec<ActivityLogEntry>>;

    async fn ping(&self) -> Result<()>;
}

/// Run `f` inside a store transaction.
///
/// Commits when `f` succeeds. Any error from `f` rolls back every write it
/// performed and is returned unchanged.
pub async fn run_in_transaction<T, F>(store: &dyn RecordStore, f: F) -> Result<T>
where
    T: Send,
    F: for<'t> FnOnce(&'t mut dyn StoreTransaction) -> BoxFuture<'t, Result<T>> + Send,
{
    let mut tx = store.begin().await?;

    match f(tx.as_mut()).await {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                // The connection drops the transaction server-side either way.
                warn!(error = %rollback_err, "explicit rollback failed");
            }
            Err(err)
        }
    }
}
