use actix_web::http::header::HeaderValue;
use validator::ValidationError;

use crate::errors::{LONG_URL_NOT_REDIRECTABLE, LONG_URL_REQUIRED};

/// Rejects blank long URLs and values that cannot be sent back as a
/// `Location` header (control characters, NUL). Syntax is left to the
/// redirect target.
pub fn validate_long_url(long_url: &str) -> Result<(), ValidationError> {
    if long_url.trim().is_empty() {
        return Err(validation_error("required", LONG_URL_REQUIRED));
    }

    if HeaderValue::from_str(long_url).is_err() {
        return Err(validation_error("not_redirectable", LONG_URL_NOT_REDIRECTABLE));
    }

    Ok(())
}

fn validation_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}
