use std::time::Duration;

use log::{debug, info, warn};
use sqlx::migrate::{MigrateDatabase, MigrateError};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Postgres;
use thiserror::Error;
use url::Url;

use crate::config::DatabaseConfig;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    Connect(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migrate(#[from] MigrateError),

    #[error("Database not found: {0}")]
    Missing(String),

    #[error("Failed to create database '{name}': {source}")]
    Create { name: String, source: sqlx::Error },
}

pub type DbResult<T> = Result<T, DatabaseError>;

/// Postgres pool holding the `urls` table
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Prepares the target database, opens the pool and applies the
    /// embedded migrations, each step as configured.
    pub async fn connect(config: &DatabaseConfig) -> DbResult<Self> {
        debug!(
            "Opening Postgres pool (connections {}..={}, acquire timeout {}s)",
            config.min_connections, config.max_connections, config.connect_timeout_seconds
        );

        if !config.skip_db_exists_check {
            ensure_database(config).await?;
        }

        let pool = PgPoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .connect(&config.url)
            .await
            .inspect_err(|e| warn!("Could not open Postgres pool: {}", e))?;
        info!("Postgres pool ready");

        if config.use_migrations {
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .inspect_err(|e| warn!("Migrations failed: {}", e))?;
            info!("Migrations applied");
        }

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Closes the pool, waiting for checked-out connections to return
    pub async fn shutdown(&self) {
        let (open, idle) = (self.pool.size(), self.pool.num_idle());
        self.pool.close().await;
        info!("Postgres pool closed ({} open, {} idle)", open, idle);
    }
}

async fn ensure_database(config: &DatabaseConfig) -> DbResult<()> {
    let name = database_name(&config.url).ok_or_else(|| {
        DatabaseError::Missing("no database name in the connection string".to_string())
    })?;

    if Postgres::database_exists(&config.url).await? {
        debug!("Database '{}' exists", name);
        return Ok(());
    }

    if !config.create_database_if_missing {
        return Err(DatabaseError::Missing(format!("'{}' does not exist", name)));
    }

    info!("Creating database '{}'", name);
    Postgres::create_database(&config.url)
        .await
        .map_err(|source| DatabaseError::Create {
            name: name.clone(),
            source,
        })?;
    info!("Created database '{}'", name);

    Ok(())
}

/// First path segment of a Postgres connection URL
fn database_name(connection_url: &str) -> Option<String> {
    let url = Url::parse(connection_url).ok()?;
    url.path_segments()?
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}
