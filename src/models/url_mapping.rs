use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::validations::validate_long_url;

/// A stored short code and the URL it redirects to. Never updated once created.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct UrlMapping {
    pub short_code: String,
    pub long_url: String,
}

// Body of POST /api/shorten
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    #[validate(custom(function = "validate_long_url"))]
    pub long_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShortenResponse {
    pub short_url: String,
}
