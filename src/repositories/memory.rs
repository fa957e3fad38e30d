use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};

use super::UrlRepositoryTrait;
use crate::errors::RepositoryError;
use crate::models::UrlMapping;

/// Process-local store. Insert-if-absent runs under the key's shard lock,
/// so it is atomic with respect to concurrent inserts of the same code.
#[derive(Default)]
pub struct MemoryUrlRepository {
    urls: DashMap<String, String>,
}

impl MemoryUrlRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

#[async_trait]
impl UrlRepositoryTrait for MemoryUrlRepository {
    async fn insert_if_absent(&self, mapping: &UrlMapping) -> Result<bool, RepositoryError> {
        match self.urls.entry(mapping.short_code.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(mapping.long_url.clone());
                Ok(true)
            }
        }
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<UrlMapping>, RepositoryError> {
        Ok(self.urls.get(code).map(|long_url| UrlMapping {
            short_code: code.to_string(),
            long_url: long_url.value().clone(),
        }))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(code: &str, url: &str) -> UrlMapping {
        UrlMapping {
            short_code: code.to_string(),
            long_url: url.to_string(),
        }
    }

    #[tokio::test]
    async fn insert_then_find() {
        let repo = MemoryUrlRepository::new();
        assert!(repo
            .insert_if_absent(&mapping("abc123", "https://example.com"))
            .await
            .unwrap());

        let found = repo.find_by_code("abc123").await.unwrap();
        assert_eq!(found, Some(mapping("abc123", "https://example.com")));
    }

    #[tokio::test]
    async fn existing_code_is_not_overwritten() {
        let repo = MemoryUrlRepository::new();
        repo.insert_if_absent(&mapping("abc123", "https://first.example"))
            .await
            .unwrap();

        let inserted = repo
            .insert_if_absent(&mapping("abc123", "https://second.example"))
            .await
            .unwrap();

        assert!(!inserted);
        assert_eq!(repo.len(), 1);
        let found = repo.find_by_code("abc123").await.unwrap().unwrap();
        assert_eq!(found.long_url, "https://first.example");
    }

    #[tokio::test]
    async fn unknown_code_is_none() {
        let repo = MemoryUrlRepository::new();
        assert_eq!(repo.find_by_code("doesnotexist").await.unwrap(), None);
        assert!(repo.ping().await.is_ok());
    }
}
