//! In-memory record store, cache and search index for orchestrator tests.
//!
//! Every implementation appends to a shared `Journal` so tests can assert the
//! order in which the orchestrator touched each dependency. Faults are toggled
//! through atomic flags.

use async_trait::async_trait;
use chrono::Utc;
use post_service::cache::CacheLayer;
use post_service::db::{RecordStore, StoreTransaction};
use post_service::error::{AppError, Result};
use post_service::models::{
    ActivityAction, ActivityLogEntry, Post, PostId, PostInput, SearchDocument,
};
use post_service::search::SearchIndex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use validator::Validate;

/// Ordered log of dependency calls shared by all fakes.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }

    /// Position of the first entry equal to `entry`.
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries().iter().filter(|e| *e == entry).count()
    }
}

#[derive(Default)]
struct StoreState {
    posts: BTreeMap<PostId, Post>,
    activity: Vec<ActivityLogEntry>,
    last_post_id: PostId,
    last_activity_id: i64,
}

/// Record store kept in a `BTreeMap`. Ids come from a counter and are never reused.
pub struct InMemoryRecordStore {
    state: Arc<Mutex<StoreState>>,
    journal: Journal,
    fail_activity_append: Arc<AtomicBool>,
}

impl InMemoryRecordStore {
    pub fn new(journal: Journal) -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState::default())),
            journal,
            fail_activity_append: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_fail_activity_append(&self, fail: bool) {
        self.fail_activity_append.store(fail, Ordering::SeqCst);
    }

    pub fn post_count(&self) -> usize {
        self.state.lock().unwrap().posts.len()
    }

    pub fn activity_count(&self) -> usize {
        self.state.lock().unwrap().activity.len()
    }

    /// Overwrite a stored post directly, bypassing the orchestrator.
    pub fn overwrite(&self, post: Post) {
        self.state.lock().unwrap().posts.insert(post.id, post);
    }
}

pub struct InMemoryTransaction {
    state: Arc<Mutex<StoreState>>,
    journal: Journal,
    fail_activity_append: bool,
    pending_posts: Vec<Post>,
    pending_activity: Vec<ActivityLogEntry>,
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    async fn insert_post(&mut self, input: &PostInput) -> Result<Post> {
        input.validate()?;

        let id = {
            let mut state = self.state.lock().unwrap();
            state.last_post_id += 1;
            state.last_post_id
        };
        let now = Utc::now();
        let post = Post {
            id,
            title: input.title.clone(),
            content: input.content.clone(),
            tags: input.tags.clone(),
            created_at: now,
            updated_at: now,
        };

        self.journal.record("store.insert");
        self.pending_posts.push(post.clone());
        Ok(post)
    }

    async fn append_activity(
        &mut self,
        action: ActivityAction,
        post_id: PostId,
    ) -> Result<ActivityLogEntry> {
        self.journal.record("store.append_activity");
        if self.fail_activity_append {
            return Err(AppError::Database("activity_logs insert failed".into()));
        }

        let id = {
            let mut state = self.state.lock().unwrap();
            state.last_activity_id += 1;
            state.last_activity_id
        };
        let entry = ActivityLogEntry {
            id,
            action: action.as_str().to_string(),
            post_id,
            logged_at: Utc::now(),
        };
        self.pending_activity.push(entry.clone());
        Ok(entry)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let InMemoryTransaction {
            state,
            journal,
            pending_posts,
            pending_activity,
            ..
        } = *self;

        {
            let mut state = state.lock().unwrap();
            for post in pending_posts {
                state.posts.insert(post.id, post);
            }
            state.activity.extend(pending_activity);
        }
        journal.record("store.commit");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.journal.record("store.rollback");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        Ok(Box::new(InMemoryTransaction {
            state: self.state.clone(),
            journal: self.journal.clone(),
            fail_activity_append: self.fail_activity_append.load(Ordering::SeqCst),
            pending_posts: Vec::new(),
            pending_activity: Vec::new(),
        }))
    }

    async fn update_post(&self, id: PostId, input: &PostInput) -> Result<Post> {
        input.validate()?;

        let mut state = self.state.lock().unwrap();
        let post = state
            .posts
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("post {} not found", id)))?;
        post.title = input.title.clone();
        post.content = input.content.clone();
        post.tags = input.tags.clone();
        post.updated_at = Utc::now();

        self.journal.record("store.update");
        Ok(post.clone())
    }

    async fn get_post(&self, id: PostId) -> Result<Post> {
        self.journal.record("store.get");
        self.state
            .lock()
            .unwrap()
            .posts
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("post {} not found", id)))
    }

    async fn search_by_tag(&self, tag: &str) -> Result<Vec<Post>> {
        self.journal.record("store.search_by_tag");
        Ok(self
            .state
            .lock()
            .unwrap()
            .posts
            .values()
            .rev()
            .filter(|p| p.tags.iter().any(|t| t == tag))
            .cloned()
            .collect())
    }

    async fn activity_for_post(&self, post_id: PostId) -> Result<Vec<ActivityLogEntry>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .activity
            .iter()
            .filter(|a| a.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Cache backed by a `HashMap`; TTL is not modelled.
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    journal: Journal,
    failing: AtomicBool,
}

impl InMemoryCache {
    pub fn new(journal: Journal) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            journal,
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }

    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    /// Place bytes under `key` directly, bypassing the orchestrator.
    pub fn put_raw(&self, key: &str, value: Vec<u8>) {
        self.entries.lock().unwrap().insert(key.to_string(), value);
    }

    fn check(&self, op: &str) -> Result<()> {
        self.journal.record(format!("cache.{}", op));
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Cache(format!("redis {} connection refused", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheLayer for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.check("get")?;
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.check("set")?;
        self.put_raw(key, value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.check("delete")?;
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.check("ping")
    }
}

/// Search index over a `BTreeMap` of documents.
///
/// Full-text matching is a case-insensitive term match over title and content.
pub struct InMemoryIndex {
    docs: Mutex<BTreeMap<PostId, SearchDocument>>,
    journal: Journal,
    unreachable: AtomicBool,
}

impl InMemoryIndex {
    pub fn new(journal: Journal) -> Self {
        Self {
            docs: Mutex::new(BTreeMap::new()),
            journal,
            unreachable: AtomicBool::new(false),
        }
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn document(&self, id: PostId) -> Option<SearchDocument> {
        self.docs.lock().unwrap().get(&id).cloned()
    }

    fn check(&self, op: &str) -> Result<()> {
        self.journal.record(format!("index.{}", op));
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(AppError::Search(format!(
                "{} failed: connection refused",
                op
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl SearchIndex for InMemoryIndex {
    async fn ensure_index(&self) -> Result<()> {
        self.check("ensure_index")
    }

    async fn index_document(&self, doc: &SearchDocument) -> Result<()> {
        self.check("upsert")?;
        self.docs.lock().unwrap().insert(doc.id, doc.clone());
        Ok(())
    }

    async fn search_full_text(&self, query: &str) -> Result<Vec<SearchDocument>> {
        self.check("search_full_text")?;

        let terms: Vec<String> = query
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .collect();
        Ok(self
            .docs
            .lock()
            .unwrap()
            .values()
            .filter(|doc| {
                let haystack = format!("{} {}", doc.title, doc.content).to_lowercase();
                terms.iter().any(|t| haystack.contains(t.as_str()))
            })
            .cloned()
            .collect())
    }

    async fn find_related(
        &self,
        exclude_id: PostId,
        tags: &[String],
        limit: usize,
    ) -> Result<Vec<SearchDocument>> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }
        self.check("find_related")?;

        Ok(self
            .docs
            .lock()
            .unwrap()
            .values()
            .filter(|doc| doc.id != exclude_id)
            .filter(|doc| doc.tags.iter().any(|t| tags.contains(t)))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        self.check("ping")
    }
}
