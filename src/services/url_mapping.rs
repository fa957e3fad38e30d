// src/services/url_mapping.rs - Business logic
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, info, warn};

use crate::errors::ServiceError;
use crate::models::UrlMapping;
use crate::repositories::UrlRepositoryTrait;
use crate::utils::id_generator;
use crate::validations::validate_long_url;

type Result<T> = std::result::Result<T, ServiceError>;

#[async_trait]
pub trait UrlServiceTrait {
    /// Allocates a fresh short code for `long_url` and persists the mapping.
    async fn shorten(&self, long_url: &str) -> Result<UrlMapping>;

    /// Returns the long URL stored under `short_code`.
    async fn resolve(&self, short_code: &str) -> Result<String>;
}

pub struct UrlService {
    repository: Arc<dyn UrlRepositoryTrait>,
    code_length: usize,
    max_attempts: usize,
}

impl UrlService {
    pub fn new(repository: Arc<dyn UrlRepositoryTrait>, code_length: usize, max_attempts: usize) -> Self {
        Self {
            repository,
            code_length,
            max_attempts,
        }
    }
}

#[async_trait]
impl UrlServiceTrait for UrlService {
    async fn shorten(&self, long_url: &str) -> Result<UrlMapping> {
        if let Err(err) = validate_long_url(long_url) {
            let reason = err
                .message
                .map(|m| m.to_string())
                .unwrap_or_else(|| err.code.to_string());
            return Err(ServiceError::InvalidInput(reason));
        }

        // Codes are drawn independently, so the store decides uniqueness
        for attempt in 1..=self.max_attempts {
            let candidate = UrlMapping {
                short_code: id_generator::generate_short_id(self.code_length),
                long_url: long_url.to_string(),
            };

            let inserted = self.repository.insert_if_absent(&candidate).await.map_err(|e| {
                error!("Failed to store short code '{}': {}", candidate.short_code, e);
                ServiceError::from(e)
            })?;

            if inserted {
                info!("Shortened '{}' as '{}'", candidate.long_url, candidate.short_code);
                return Ok(candidate);
            }

            debug!(
                "Short code '{}' collided (attempt {}/{})",
                candidate.short_code, attempt, self.max_attempts
            );
        }

        warn!(
            "Failed to allocate a unique short code after {} attempts",
            self.max_attempts
        );
        Err(ServiceError::AllocationExhausted(self.max_attempts))
    }

    async fn resolve(&self, short_code: &str) -> Result<String> {
        // Nothing outside the alphabet is ever stored
        if !id_generator::is_short_code(short_code) {
            debug!("Rejecting malformed short code {:?}", short_code);
            return Err(ServiceError::NotFound(format!(
                "No URL for short code {:?}",
                short_code
            )));
        }

        match self.repository.find_by_code(short_code).await? {
            Some(mapping) => Ok(mapping.long_url),
            None => Err(ServiceError::NotFound(format!(
                "No URL for short code '{}'",
                short_code
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use mockall::Sequence;

    use super::*;
    use crate::errors::{RepositoryError, LONG_URL_NOT_REDIRECTABLE, LONG_URL_REQUIRED};
    use crate::repositories::{MemoryUrlRepository, MockUrlRepositoryTrait};
    use crate::utils::id_generator::{ALPHABET, DEFAULT_CODE_LENGTH};

    fn memory_service() -> (Arc<MemoryUrlRepository>, UrlService) {
        let repository = Arc::new(MemoryUrlRepository::new());
        let service = UrlService::new(repository.clone(), DEFAULT_CODE_LENGTH, 5);
        (repository, service)
    }

    #[tokio::test]
    async fn shorten_then_resolve_returns_original() {
        let (_, service) = memory_service();
        let long_url = "https://example.com/some/long/path?with=query&and=more#frag";

        let mapping = service.shorten(long_url).await.unwrap();

        assert_eq!(mapping.short_code.len(), DEFAULT_CODE_LENGTH);
        assert!(mapping.short_code.bytes().all(|b| ALPHABET.contains(&b)));
        assert_eq!(service.resolve(&mapping.short_code).await.unwrap(), long_url);
    }

    #[tokio::test]
    async fn unknown_code_is_not_found() {
        let (_, service) = memory_service();
        let err = service.resolve("doesnotexist").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn empty_url_is_rejected_without_writing() {
        let (repository, service) = memory_service();

        let err = service.shorten("").await.unwrap_err();

        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert!(repository.is_empty());
    }

    #[tokio::test]
    async fn empty_url_never_reaches_the_store() {
        let mut repository = MockUrlRepositoryTrait::new();
        repository.expect_insert_if_absent().never();

        let service = UrlService::new(Arc::new(repository), DEFAULT_CODE_LENGTH, 5);
        assert!(matches!(
            service.shorten("   ").await,
            Err(ServiceError::InvalidInput(msg)) if msg == LONG_URL_REQUIRED
        ));
    }

    #[tokio::test]
    async fn unredirectable_url_never_reaches_the_store() {
        let mut repository = MockUrlRepositoryTrait::new();
        repository.expect_insert_if_absent().never();

        let service = UrlService::new(Arc::new(repository), DEFAULT_CODE_LENGTH, 5);
        for long_url in ["https://example.com/a\nb", "https://example.com/\0"] {
            assert!(matches!(
                service.shorten(long_url).await,
                Err(ServiceError::InvalidInput(msg)) if msg == LONG_URL_NOT_REDIRECTABLE
            ));
        }
    }

    #[tokio::test]
    async fn malformed_code_is_not_found_without_a_lookup() {
        let mut repository = MockUrlRepositoryTrait::new();
        repository.expect_find_by_code().never();

        let service = UrlService::new(Arc::new(repository), DEFAULT_CODE_LENGTH, 5);
        for short_code in ["\0abc", "ab/c!", "", "abc 12"] {
            let err = service.resolve(short_code).await.unwrap_err();
            assert!(matches!(err, ServiceError::NotFound(_)), "{:?}", short_code);
        }
    }

    #[tokio::test]
    async fn collision_triggers_retry_with_new_code() {
        let mut repository = MockUrlRepositoryTrait::new();
        let mut seq = Sequence::new();
        repository
            .expect_insert_if_absent()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Ok(false));
        repository
            .expect_insert_if_absent()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|mapping| mapping.long_url == "https://example.com")
            .returning(|_| Ok(true));

        let service = UrlService::new(Arc::new(repository), DEFAULT_CODE_LENGTH, 5);
        let mapping = service.shorten("https://example.com").await.unwrap();
        assert_eq!(mapping.long_url, "https://example.com");
    }

    #[tokio::test]
    async fn persistent_collisions_exhaust_allocation() {
        let mut repository = MockUrlRepositoryTrait::new();
        repository
            .expect_insert_if_absent()
            .times(5)
            .returning(|_| Ok(false));

        let service = UrlService::new(Arc::new(repository), DEFAULT_CODE_LENGTH, 5);
        let err = service.shorten("https://example.com").await.unwrap_err();
        assert!(matches!(err, ServiceError::AllocationExhausted(5)));
    }

    #[tokio::test]
    async fn storage_failure_is_reported_not_retried() {
        let mut repository = MockUrlRepositoryTrait::new();
        repository
            .expect_insert_if_absent()
            .times(1)
            .returning(|_| Err(RepositoryError::Database(sqlx::Error::PoolTimedOut)));

        let service = UrlService::new(Arc::new(repository), DEFAULT_CODE_LENGTH, 5);
        let err = service.shorten("https://example.com").await.unwrap_err();
        assert!(matches!(err, ServiceError::StorageUnavailable(_)));
    }

    #[tokio::test]
    async fn resolve_distinguishes_storage_failure_from_not_found() {
        let mut repository = MockUrlRepositoryTrait::new();
        repository
            .expect_find_by_code()
            .returning(|_| Err(RepositoryError::Database(sqlx::Error::PoolTimedOut)));

        let service = UrlService::new(Arc::new(repository), DEFAULT_CODE_LENGTH, 5);
        let err = service.resolve("abc123").await.unwrap_err();
        assert!(matches!(err, ServiceError::StorageUnavailable(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_shortens_never_share_a_code() {
        // one-character codes force frequent collisions
        let repository = Arc::new(MemoryUrlRepository::new());
        let service = Arc::new(UrlService::new(repository.clone(), 1, 50));

        let tasks: Vec<_> = (0..40)
            .map(|i| {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.shorten(&format!("https://example.com/{}", i)).await })
            })
            .collect();

        let mut codes = HashSet::new();
        for task in tasks {
            let mapping = task.await.unwrap().unwrap();
            assert!(codes.insert(mapping.short_code.clone()), "duplicate code");
            assert_eq!(service.resolve(&mapping.short_code).await.unwrap(), mapping.long_url);
        }
        assert_eq!(repository.len(), 40);
    }
}
