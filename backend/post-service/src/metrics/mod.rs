//! Prometheus metrics for post-service.
//!
//! Exposes cache, search and soft-failure collectors and an HTTP handler for
//! the `/metrics` endpoint.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

lazy_static! {
    /// Post cache lookups by outcome (hit/miss/error).
    pub static ref POST_CACHE_EVENTS: IntCounterVec = register_int_counter_vec!(
        "post_cache_events_total",
        "Post cache lookups segmented by outcome",
        &["event"]
    )
    .expect("failed to register post_cache_events_total");

    /// Cache and search-index failures that were logged and discarded.
    pub static ref SOFT_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "post_service_soft_failures_total",
        "Non-authoritative dependency failures absorbed by post-service",
        &["dependency", "operation"]
    )
    .expect("failed to register post_service_soft_failures_total");

    /// Search index requests by kind (index/full_text/related) and result.
    pub static ref SEARCH_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "post_search_requests_total",
        "Search index requests segmented by kind and result",
        &["kind", "result"]
    )
    .expect("failed to register post_search_requests_total");
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
