use std::io::Error as IoError;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub mod config;
pub mod repository;
pub mod service;

pub use config::ConfigError;
pub use repository::RepositoryError;
pub use service::ServiceError;

use crate::db::DatabaseError;

pub const NOT_FOUND_BODY: &str = "URL not found";
pub const LONG_URL_REQUIRED: &str = "long_url required";
pub const LONG_URL_NOT_REDIRECTABLE: &str = "long_url contains characters not allowed in a redirect";

#[derive(Debug, Error)]
pub enum AppError {
    // Request-level errors
    #[error("{0}")]
    InvalidInput(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Rate limit exceeded")]
    RateLimited,
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("Allocation exhausted after {0} attempts")]
    AllocationExhausted(usize),
    // Infrastructure/system errors
    #[error("Server error: {0}")]
    Server(#[from] IoError),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Logger error: {0}")]
    Logger(String),
    #[error("Database error: {0}")]
    Database(String),
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<DatabaseError> for AppError {
    fn from(e: DatabaseError) -> Self {
        AppError::Database(e.to_string())
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidInput(msg) => AppError::InvalidInput(msg),
            ServiceError::NotFound(msg) => AppError::NotFound(msg),
            ServiceError::StorageUnavailable(msg) => AppError::StorageUnavailable(msg),
            ServiceError::AllocationExhausted(attempts) => AppError::AllocationExhausted(attempts),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        // Only the reasons are reported; the field name is part of each message
        let message = errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string())
            })
            .collect::<Vec<_>>()
            .join("; ");
        AppError::InvalidInput(message)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::AllocationExhausted(_)
            | AppError::Server(_)
            | AppError::Config(_)
            | AppError::Logger(_)
            | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = match self {
            AppError::NotFound(_) => {
                return HttpResponse::build(status)
                    .content_type("text/plain; charset=utf-8")
                    .body(NOT_FOUND_BODY);
            }
            AppError::InvalidInput(msg) if msg.is_empty() => LONG_URL_REQUIRED.to_string(),
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::RateLimited => self.to_string(),
            AppError::StorageUnavailable(_) => "Storage unavailable".to_string(),
            AppError::AllocationExhausted(_) => "Could not allocate a short code".to_string(),
            _ => "Internal server error".to_string(),
        };

        HttpResponse::build(status).json(json!({ "error": message }))
    }
}

#[cfg(test)]
mod tests {
    use actix_web::body::to_bytes;

    use super::*;

    async fn body_of(err: AppError) -> (StatusCode, String) {
        let response = err.error_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.unwrap_or_default();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[actix_web::test]
    async fn rate_limited_maps_to_429_with_json_error() {
        let (status, body) = body_of(AppError::RateLimited).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body, r#"{"error":"Rate limit exceeded"}"#);
    }

    #[actix_web::test]
    async fn not_found_is_plain_text() {
        let (status, body) = body_of(AppError::NotFound("abc123".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, NOT_FOUND_BODY);
    }

    #[actix_web::test]
    async fn invalid_input_keeps_its_message() {
        let (status, body) = body_of(AppError::InvalidInput(LONG_URL_REQUIRED.into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, r#"{"error":"long_url required"}"#);
    }

    #[test]
    fn storage_and_allocation_failures_are_distinct() {
        assert_eq!(
            AppError::StorageUnavailable("down".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::AllocationExhausted(5).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn service_errors_keep_their_kind() {
        assert!(matches!(
            AppError::from(ServiceError::AllocationExhausted(5)),
            AppError::AllocationExhausted(5)
        ));
        assert!(matches!(
            AppError::from(ServiceError::NotFound("x".into())),
            AppError::NotFound(_)
        ));
    }

    #[test]
    fn config_errors_carry_their_reason_to_exit() {
        let err = AppError::from(ConfigError::InvalidValue(
            "SHORT_CODE_LENGTH must be at least 1".into(),
        ));
        assert!(
            matches!(&err, AppError::Config(msg) if msg.contains("SHORT_CODE_LENGTH")),
            "{:?}",
            err
        );
    }
}
