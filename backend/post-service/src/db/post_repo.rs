use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;
use validator::Validate;

use super::{RecordStore, StoreTransaction};
use crate::error::{AppError, Result};
use crate::models::{ActivityAction, ActivityLogEntry, Post, PostId, PostInput};

const POST_COLUMNS: &str = "id, title, content, tags, created_at, updated_at";

fn not_found(id: PostId) -> AppError {
    AppError::NotFound(format!("post {} not found", id))
}

/// PostgreSQL-backed record store.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// A transaction on the PostgreSQL record store.
pub struct PgStoreTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PgStoreTransaction {
    async fn insert_post(&mut self, input: &PostInput) -> Result<Post> {
        input.validate()?;

        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO posts (title, content, tags)
            VALUES ($1, $2, $3)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(&input.title)
        .bind(&input.content)
        .bind(&input.tags)
        .fetch_one(&mut *self.tx)
        .await?;

        debug!(post_id = post.id, "inserted post");
        Ok(post)
    }

    async fn append_activity(
        &mut self,
        action: ActivityAction,
        post_id: PostId,
    ) -> Result<ActivityLogEntry> {
        let entry = sqlx::query_as::<_, ActivityLogEntry>(
            r#"
            INSERT INTO activity_logs (action, post_id)
            VALUES ($1, $2)
            RETURNING id, action, post_id, logged_at
            "#,
        )
        .bind(action.as_str())
        .bind(post_id)
        .fetch_one(&mut *self.tx)
        .await?;

        debug!(post_id, action = %action, "appended activity");
        Ok(entry)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgStoreTransaction { tx }))
    }

    async fn update_post(&self, id: PostId, input: &PostInput) -> Result<Post> {
        input.validate()?;

        sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts
            SET title = $1, content = $2, tags = $3, updated_at = NOW()
            WHERE id = $4
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(&input.title)
        .bind(&input.content)
        .bind(&input.tags)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(id))
    }

    async fn get_post(&self, id: PostId) -> Result<Post> {
        sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(id))
    }

    async fn search_by_tag(&self, tag: &str) -> Result<Vec<Post>> {
        // tags @> ARRAY[tag] is served by the GIN index on posts.tags
        let posts = sqlx::query_as::<_, Post>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE tags @> ARRAY[$1]::text[]
            ORDER BY id DESC
            "#
        ))
        .bind(tag)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn activity_for_post(&self, post_id: PostId) -> Result<Vec<ActivityLogEntry>> {
        let entries = sqlx::query_as::<_, ActivityLogEntry>(
            r#"
            SELECT id, action, post_id, logged_at
            FROM activity_logs
            WHERE post_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
