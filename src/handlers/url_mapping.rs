use actix_web::{
    error::JsonPayloadError, http::header::LOCATION, web, Error, HttpRequest, HttpResponse,
    Responder,
};
use log::{debug, info};
use validator::Validate;

use crate::{
    config::ShortenerConfig,
    errors::{AppError, LONG_URL_REQUIRED},
    models::{ShortenRequest, ShortenResponse},
    services::{UrlService, UrlServiceTrait},
    types::Result,
};

/// Create short URL route handler
pub async fn shorten_handler(
    req: HttpRequest,
    dto: web::Json<ShortenRequest>,
    service: web::Data<UrlService>,
    config: web::Data<ShortenerConfig>,
) -> Result<impl Responder> {
    let dto = dto.into_inner();
    dto.validate()?;

    let mapping = service.shorten(&dto.long_url).await?;

    let origin = {
        let info = req.connection_info();
        format!("{}://{}", info.scheme(), info.host())
    };
    let short_url = config.short_url(&origin, &mapping.short_code);

    Ok(HttpResponse::Ok().json(ShortenResponse { short_url }))
}

/// Redirect route handler
pub async fn redirect_handler(
    path: web::Path<String>,
    service: web::Data<UrlService>,
) -> Result<impl Responder> {
    let short_code = path.into_inner();
    debug!("Redirect requested for code: {}", short_code);

    let long_url = service.resolve(&short_code).await?;

    info!("Redirecting '{}' to '{}'", short_code, long_url);
    Ok(HttpResponse::Found()
        .insert_header((LOCATION, long_url))
        .finish())
}

/// Malformed or missing JSON bodies all mean the same thing to callers
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> Error {
    debug!("Rejected shorten body: {}", err);
    AppError::InvalidInput(LONG_URL_REQUIRED.to_string()).into()
}
