use std::sync::Arc;

use actix_web::web;

use crate::{
    config::RateLimitConfig,
    handlers::{json_error_handler, redirect_handler, shorten_handler},
    middleware::RateLimit,
    services::RateLimiter,
};

pub fn configure_routes(
    cfg: &mut web::ServiceConfig,
    limiter: Arc<RateLimiter>,
    rate_limit: &RateLimitConfig,
) {
    cfg.service(
        web::resource("/api/shorten")
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .route(web::post().to(shorten_handler))
            .wrap(
                RateLimit::new(Arc::clone(&limiter))
                    .trust_proxy_headers(rate_limit.trust_proxy_headers),
            ),
    );

    cfg.service(
        web::resource("/{short_code}")
            .route(web::get().to(redirect_handler))
            .wrap(
                RateLimit::new(limiter)
                    .enabled(rate_limit.limit_redirects)
                    .trust_proxy_headers(rate_limit.trust_proxy_headers),
            ),
    );
}
