// src/repositories/url_mapping.rs - Data access
use async_trait::async_trait;
use log::{debug, error};
use sqlx::{PgPool, Postgres, Transaction};

use crate::db::Database;
use crate::errors::RepositoryError;
use crate::models::UrlMapping;

type Result<T> = std::result::Result<T, RepositoryError>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UrlRepositoryTrait: Send + Sync {
    /// Stores a mapping unless its short code is already taken
    ///
    /// ### Arguments
    /// * `mapping` - The short code and long URL to persist
    ///
    /// ### Returns
    /// * `Result<bool>` - `true` if the row was written, `false` if the code
    ///   already existed and nothing was stored
    ///
    /// ### Errors
    /// * `RepositoryError::Database` - If the store is unreachable or the write failed
    async fn insert_if_absent(&self, mapping: &UrlMapping) -> Result<bool>;

    /// Finds the mapping for a short code
    ///
    /// ### Returns
    /// * `Result<Option<UrlMapping>>` - The mapping if found, or `None`
    ///
    /// ### Errors
    /// * `RepositoryError::Database` - If a database error occurs
    async fn find_by_code(&self, code: &str) -> Result<Option<UrlMapping>>;

    /// Cheap round trip used by the health endpoint
    async fn ping(&self) -> Result<()>;
}

// Implementation using actual database
pub struct PgUrlRepository {
    pool: PgPool,
}

impl PgUrlRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    async fn begin_transaction(&self) -> Result<Transaction<'_, Postgres>> {
        self.pool.begin().await.map_err(|e| {
            error!("Failed to start database transaction: {}", e);
            RepositoryError::Database(e)
        })
    }
}

#[async_trait]
impl UrlRepositoryTrait for PgUrlRepository {
    async fn insert_if_absent(&self, mapping: &UrlMapping) -> Result<bool> {
        let mut tx = self.begin_transaction().await?;

        // The primary key arbitrates concurrent inserts of the same code
        let inserted = sqlx::query_scalar::<_, String>(
            r#"
                INSERT INTO urls (short_code, long_url)
                VALUES ($1, $2)
                ON CONFLICT (short_code) DO NOTHING
                RETURNING short_code
            "#,
        )
        .bind(&mapping.short_code)
        .bind(&mapping.long_url)
        .fetch_optional(&mut *tx)
        .await
        .map_err(RepositoryError::from);

        let inserted = match inserted {
            Ok(row) => row.is_some(),
            Err(RepositoryError::Conflict(_)) => false,
            Err(e) => {
                error!("Failed to insert url mapping: {}", e);
                return Err(e);
            }
        };

        tx.commit().await.map_err(|e| {
            error!("Failed to commit transaction: {}", e);
            RepositoryError::Database(e)
        })?;

        if !inserted {
            debug!("Short code '{}' already taken", mapping.short_code);
        }
        Ok(inserted)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<UrlMapping>> {
        sqlx::query_as::<_, UrlMapping>(
            r#"
            SELECT short_code, long_url
            FROM urls
            WHERE short_code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::Database)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(RepositoryError::Database)
    }
}
