use std::sync::Arc;

use actix_web::web;

mod rate_limiter;
mod url_mapping;

pub use rate_limiter::{Admission, RateLimiter};
pub use url_mapping::{UrlService, UrlServiceTrait};

use crate::{config::ShortenerConfig, repositories::UrlRepositoryTrait};

/// Service Register
pub fn register(
    repository: Arc<dyn UrlRepositoryTrait>,
    config: &ShortenerConfig,
    cfg: &mut web::ServiceConfig,
) {
    let url_service = UrlService::new(repository, config.code_length, config.max_attempts);
    cfg.app_data(web::Data::new(url_service))
        .app_data(web::Data::new(config.clone()));
}
