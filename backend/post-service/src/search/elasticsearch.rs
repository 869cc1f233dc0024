use async_trait::async_trait;
use elasticsearch::{
    auth::Credentials,
    http::response::Response,
    http::transport::{BuildError, SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts},
    params::Refresh,
    Elasticsearch, IndexParts, SearchParts,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use super::SearchIndex;
use crate::config::SearchConfig;
use crate::error::Result;
use crate::metrics::SEARCH_REQUESTS_TOTAL;
use crate::models::{PostId, SearchDocument};

#[derive(Debug, Error)]
pub enum ElasticsearchError {
    #[error("invalid Elasticsearch URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("failed to build transport: {0}")]
    TransportBuild(#[from] BuildError),
    #[error("transport error: {0}")]
    Transport(#[from] elasticsearch::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("{operation} returned HTTP {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },
}

/// Elasticsearch-backed search index for posts.
#[derive(Clone)]
pub struct ElasticsearchIndex {
    client: Elasticsearch,
    index: String,
}

impl ElasticsearchIndex {
    /// Build a client. No request is sent until the first operation.
    pub fn new(config: &SearchConfig) -> std::result::Result<Self, ElasticsearchError> {
        let parsed = Url::parse(&config.url)?;
        let pool = SingleNodeConnectionPool::new(parsed);

        let mut builder =
            TransportBuilder::new(pool).timeout(Duration::from_millis(config.timeout_ms));
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.auth(Credentials::Basic(username.clone(), password.clone()));
        }
        let transport = builder.build()?;

        Ok(Self {
            client: Elasticsearch::new(transport),
            index: config.post_index.clone(),
        })
    }

    pub fn index_name(&self) -> &str {
        &self.index
    }

    async fn search_documents(
        &self,
        kind: &'static str,
        body: Value,
    ) -> std::result::Result<Vec<SearchDocument>, ElasticsearchError> {
        let outcome = async {
            let response = self
                .client
                .search(SearchParts::Index(&[self.index.as_str()]))
                .body(body)
                .send()
                .await?;
            let response = ensure_success(kind, response).await?;
            let parsed: SearchResponse = response.json().await?;
            Ok::<_, ElasticsearchError>(parsed.into_documents())
        }
        .await;

        record(kind, outcome.is_ok());
        outcome
    }
}

#[async_trait]
impl SearchIndex for ElasticsearchIndex {
    async fn ensure_index(&self) -> Result<()> {
        let exists = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[self.index.as_str()]))
            .send()
            .await
            .map_err(ElasticsearchError::from)?;

        if exists.status_code().is_success() {
            debug!(index = %self.index, "search index already exists");
            return Ok(());
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(&self.index))
            .body(index_mapping())
            .send()
            .await
            .map_err(ElasticsearchError::from)?;

        let status = response.status_code();
        if status.is_success() {
            info!(index = %self.index, "created search index");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        // Another instance created it between our exists check and create.
        if body.contains("resource_already_exists_exception") {
            return Ok(());
        }

        Err(ElasticsearchError::Status {
            operation: "create index",
            status: status.as_u16(),
            body,
        }
        .into())
    }

    async fn index_document(&self, doc: &SearchDocument) -> Result<()> {
        let outcome = async {
            let response = self
                .client
                .index(IndexParts::IndexId(&self.index, &doc.id.to_string()))
                .refresh(Refresh::True)
                .body(doc)
                .send()
                .await?;
            ensure_success("index", response).await?;
            Ok::<_, ElasticsearchError>(())
        }
        .await;

        record("index", outcome.is_ok());
        outcome?;
        debug!(post_id = doc.id, "indexed post document");
        Ok(())
    }

    async fn search_full_text(&self, query: &str) -> Result<Vec<SearchDocument>> {
        Ok(self
            .search_documents("full_text", full_text_query(query))
            .await?)
    }

    async fn find_related(
        &self,
        exclude_id: PostId,
        tags: &[String],
        limit: usize,
    ) -> Result<Vec<SearchDocument>> {
        let Some(body) = related_query(exclude_id, tags, limit) else {
            return Ok(Vec::new());
        };

        Ok(self.search_documents("related", body).await?)
    }

    async fn ping(&self) -> Result<()> {
        let response = self
            .client
            .ping()
            .send()
            .await
            .map_err(ElasticsearchError::from)?;
        ensure_success("ping", response).await?;
        Ok(())
    }
}

async fn ensure_success(
    operation: &'static str,
    response: Response,
) -> std::result::Result<Response, ElasticsearchError> {
    let status = response.status_code();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ElasticsearchError::Status {
        operation,
        status: status.as_u16(),
        body,
    })
}

fn record(kind: &'static str, ok: bool) {
    SEARCH_REQUESTS_TOTAL
        .with_label_values(&[kind, if ok { "success" } else { "error" }])
        .inc();
}

/// Index settings: analyzed title/content, exact-match tags.
pub fn index_mapping() -> Value {
    json!({
        "mappings": {
            "properties": {
                "id": { "type": "long" },
                "title": { "type": "text" },
                "content": { "type": "text" },
                "tags": { "type": "keyword" }
            }
        }
    })
}

pub fn full_text_query(query: &str) -> Value {
    json!({
        "query": {
            "multi_match": {
                "query": query,
                "fields": ["title", "content"]
            }
        }
    })
}

/// OR-of-tags query excluding one document. `None` when there is nothing to match.
pub fn related_query(exclude_id: PostId, tags: &[String], limit: usize) -> Option<Value> {
    let mut seen = std::collections::HashSet::new();
    let should: Vec<Value> = tags
        .iter()
        .filter(|tag| seen.insert(tag.as_str()))
        .map(|tag| json!({ "term": { "tags": tag } }))
        .collect();

    if should.is_empty() {
        return None;
    }

    Some(json!({
        "size": limit,
        "query": {
            "bool": {
                "should": should,
                "minimum_should_match": 1,
                "must_not": [
                    { "ids": { "values": [exclude_id.to_string()] } }
                ]
            }
        }
    }))
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: InnerHits,
}

#[derive(Debug, Deserialize)]
struct InnerHits {
    hits: Vec<PostHit>,
}

#[derive(Debug, Deserialize)]
struct PostHit {
    #[serde(rename = "_source")]
    source: Option<SearchDocument>,
}

impl SearchResponse {
    fn into_documents(self) -> Vec<SearchDocument> {
        self.hits
            .hits
            .into_iter()
            .filter_map(|hit| hit.source)
            .collect()
    }
}
