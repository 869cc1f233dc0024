//! Shared fixtures for post-service integration tests.

#![allow(dead_code)]

pub mod in_memory;

use in_memory::{InMemoryCache, InMemoryIndex, InMemoryRecordStore, Journal};
use post_service::models::PostInput;
use post_service::services::PostService;
use std::sync::Arc;

/// A `PostService` wired to in-memory dependencies, plus handles to inspect them.
pub struct Harness {
    pub journal: Journal,
    pub store: Arc<InMemoryRecordStore>,
    pub cache: Arc<InMemoryCache>,
    pub index: Arc<InMemoryIndex>,
    pub service: PostService,
}

impl Harness {
    pub fn new() -> Self {
        let journal = Journal::default();
        let store = Arc::new(InMemoryRecordStore::new(journal.clone()));
        let cache = Arc::new(InMemoryCache::new(journal.clone()));
        let index = Arc::new(InMemoryIndex::new(journal.clone()));
        let service = PostService::new(store.clone(), cache.clone(), index.clone());

        Self {
            journal,
            store,
            cache,
            index,
            service,
        }
    }
}

pub fn input(title: &str, content: &str, tags: &[&str]) -> PostInput {
    PostInput::new(
        title,
        content,
        tags.iter().map(|t| t.to_string()).collect(),
    )
}
