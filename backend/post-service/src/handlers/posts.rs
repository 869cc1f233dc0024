/// Post handlers - HTTP endpoints for post operations
use crate::error::{AppError, Result};
use crate::models::{PostId, PostInput};
use crate::services::PostService;
use actix_web::{web, HttpResponse};
use serde::Deserialize;

use super::{with_deadline, RequestDeadline};

#[derive(Debug, Deserialize)]
pub struct GetPostQuery {
    pub include_related: Option<String>,
}

impl GetPostQuery {
    fn wants_related(&self) -> bool {
        self.include_related.as_deref() == Some("true")
    }
}

#[derive(Debug, Deserialize)]
pub struct TagQuery {
    pub tag: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FullTextQuery {
    pub q: Option<String>,
}

fn parse_post_id(raw: &str) -> Result<PostId> {
    match raw.parse::<PostId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::BadRequest(format!("invalid post id '{}'", raw))),
    }
}

fn required_param(value: Option<String>, name: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::BadRequest(format!(
            "query parameter '{}' is required",
            name
        ))),
    }
}

/// Create a new post
pub async fn create_post(
    service: web::Data<PostService>,
    deadline: web::Data<RequestDeadline>,
    req: web::Json<PostInput>,
) -> Result<HttpResponse> {
    let post = with_deadline(&deadline, service.create_post(req.into_inner())).await?;

    Ok(HttpResponse::Created().json(post))
}

/// Get a post by ID, with related posts when `include_related=true`
pub async fn get_post(
    service: web::Data<PostService>,
    deadline: web::Data<RequestDeadline>,
    path: web::Path<String>,
    query: web::Query<GetPostQuery>,
) -> Result<HttpResponse> {
    let post_id = parse_post_id(&path)?;

    if query.wants_related() {
        let bundle = with_deadline(&deadline, service.get_post_with_related(post_id)).await?;
        return Ok(HttpResponse::Ok().json(bundle));
    }

    let post = with_deadline(&deadline, service.get_post(post_id)).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// Replace a post's title, content and tags
pub async fn update_post(
    service: web::Data<PostService>,
    deadline: web::Data<RequestDeadline>,
    path: web::Path<String>,
    req: web::Json<PostInput>,
) -> Result<HttpResponse> {
    let post_id = parse_post_id(&path)?;
    let post = with_deadline(&deadline, service.update_post(post_id, req.into_inner())).await?;

    Ok(HttpResponse::Ok().json(post))
}

pub async fn search_by_tag(
    service: web::Data<PostService>,
    deadline: web::Data<RequestDeadline>,
    query: web::Query<TagQuery>,
) -> Result<HttpResponse> {
    let tag = required_param(query.into_inner().tag, "tag")?;
    let posts = with_deadline(&deadline, service.search_by_tag(&tag)).await?;

    Ok(HttpResponse::Ok().json(posts))
}

pub async fn search_full_text(
    service: web::Data<PostService>,
    deadline: web::Data<RequestDeadline>,
    query: web::Query<FullTextQuery>,
) -> Result<HttpResponse> {
    let q = required_param(query.into_inner().q, "q")?;
    let docs = with_deadline(&deadline, service.search_full_text(&q)).await?;

    Ok(HttpResponse::Ok().json(docs))
}
