/// Liveness and readiness endpoints
///
/// The record store decides readiness. Cache and search index failures are
/// reported as degraded because every path that uses them tolerates errors.
use crate::services::PostService;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct ComponentCheck {
    pub status: ComponentStatus,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub status: ComponentStatus,
    pub checks: HashMap<String, ComponentCheck>,
    pub timestamp: String,
}

pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": crate::config::SERVICE_NAME,
    }))
}

fn check(
    result: &Result<(), String>,
    failed_status: ComponentStatus,
    ok_message: &str,
    name: &str,
) -> ComponentCheck {
    match result {
        Ok(()) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: ok_message.to_string(),
        },
        Err(e) => ComponentCheck {
            status: failed_status,
            message: format!("{} check failed: {}", name, e),
        },
    }
}

pub async fn readiness(service: web::Data<PostService>) -> HttpResponse {
    let health = service.dependency_health().await;

    let mut checks = HashMap::new();
    checks.insert(
        "postgresql".to_string(),
        check(
            &health.store,
            ComponentStatus::Unhealthy,
            "PostgreSQL connection successful",
            "PostgreSQL",
        ),
    );
    checks.insert(
        "redis".to_string(),
        check(
            &health.cache,
            ComponentStatus::Degraded,
            "Redis ping successful",
            "Redis",
        ),
    );
    checks.insert(
        "elasticsearch".to_string(),
        check(
            &health.index,
            ComponentStatus::Degraded,
            "Elasticsearch ping successful",
            "Elasticsearch",
        ),
    );

    let ready = health.store.is_ok();
    let status = if !ready {
        ComponentStatus::Unhealthy
    } else if health.cache.is_err() || health.index.is_err() {
        ComponentStatus::Degraded
    } else {
        ComponentStatus::Healthy
    };

    let response = ReadinessResponse {
        ready,
        status,
        checks,
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}
