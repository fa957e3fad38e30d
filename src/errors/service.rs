use thiserror::Error;

use super::RepositoryError;

/// Error type for service operations
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input rejected before touching the store
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No mapping exists for the requested short code
    #[error("Not found: {0}")]
    NotFound(String),

    /// The store could not be reached or the write failed
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Every candidate code collided with an existing mapping
    #[error("Allocation exhausted after {0} attempts")]
    AllocationExhausted(usize),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::InvalidData(msg) => Self::InvalidInput(msg),
            RepositoryError::Conflict(msg) => Self::StorageUnavailable(msg),
            RepositoryError::Database(e) => Self::StorageUnavailable(e.to_string()),
        }
    }
}
