use std::sync::Arc;
use std::time::Instant;

use actix_web::{web, HttpResponse, Responder};

mod url_mapping;

use crate::{
    config::RateLimitConfig,
    services::RateLimiter,
    types::{AppState, HealthStatus, StorageHealth, StorageStatus},
};

pub const LIVENESS_MESSAGE: &str = "URL Shortener API is running";

// Handler function for the root route "/"
async fn index() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(LIVENESS_MESSAGE)
}

// Handler function for the health check endpoint
async fn health_check(data: web::Data<AppState>) -> impl Responder {
    let uptime = data.start_time.elapsed().as_secs();

    let started = Instant::now();
    let ping = data.repository.ping().await;
    let response_time_ms = started.elapsed().as_millis() as u64;

    let storage = match ping {
        Ok(()) => StorageHealth {
            backend: data.backend.to_string(),
            status: StorageStatus::Healthy,
            response_time_ms,
            message: None,
        },
        Err(e) => StorageHealth {
            backend: data.backend.to_string(),
            status: StorageStatus::Unhealthy,
            response_time_ms,
            message: Some(format!("Storage ping failed: {}", e)),
        },
    };

    let status = match storage.status {
        StorageStatus::Healthy => "OK",
        StorageStatus::Unhealthy => "DEGRADED",
    };

    HttpResponse::Ok().json(HealthStatus {
        status: status.to_string(),
        version: data.version.clone(),
        uptime_seconds: uptime,
        storage,
    })
}

// Configure all routes function
pub fn configure_routes(
    cfg: &mut web::ServiceConfig,
    limiter: Arc<RateLimiter>,
    rate_limit: &RateLimitConfig,
) {
    cfg.route("/", web::get().to(index));
    cfg.route("/api/health", web::get().to(health_check));
    // catch-all `/{short_code}` must come last
    url_mapping::configure_routes(cfg, limiter, rate_limit);
}
