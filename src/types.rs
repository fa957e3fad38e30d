use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::{errors::AppError, repositories::UrlRepositoryTrait};

// Result type for handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageHealth {
    pub backend: String,
    pub status: StorageStatus,
    pub response_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub storage: StorageHealth,
}

// Shared application state
pub struct AppState {
    pub start_time: Instant,
    pub version: String,
    pub backend: &'static str,
    pub repository: Arc<dyn UrlRepositoryTrait>,
}
