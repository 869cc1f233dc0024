/// HTTP handlers for post-service
///
/// - Posts: create, read (optionally with related posts), update
/// - Search: by tag (record store) and full text (search index)
/// - Health: liveness and dependency readiness
pub mod health;
pub mod posts;

use actix_web::web;
use std::future::Future;
use std::time::Duration;

use crate::error::{AppError, Result};

pub use health::{liveness, readiness};
pub use posts::{create_post, get_post, search_by_tag, search_full_text, update_post};

/// Overall time budget for a single request, shared through `web::Data`.
#[derive(Debug, Clone, Copy)]
pub struct RequestDeadline(pub Duration);

impl Default for RequestDeadline {
    fn default() -> Self {
        Self(Duration::from_secs(10))
    }
}

/// Run `fut` under the request deadline. Elapsed deadlines drop the future.
pub(crate) async fn with_deadline<T, F>(deadline: &RequestDeadline, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(deadline.0, fut)
        .await
        .map_err(|_| AppError::Timeout(format!("request exceeded {}ms", deadline.0.as_millis())))?
}

/// Register the post API under `/api/v1/posts`.
///
/// Search routes come before `/{id}` so they are not captured as ids.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/posts")
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                AppError::BadRequest(err.to_string()).into()
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                AppError::BadRequest(err.to_string()).into()
            }))
            .route("", web::post().to(create_post))
            .route("/search-by-tag", web::get().to(search_by_tag))
            .route("/search", web::get().to(search_full_text))
            .route("/{id}", web::get().to(get_post))
            .route("/{id}", web::put().to(update_post)),
    );
}

/// Register `/health` and `/health/ready`.
pub fn configure_health(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(liveness))
        .route("/health/ready", web::get().to(readiness));
}
