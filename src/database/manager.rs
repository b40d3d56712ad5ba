use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config;

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl From<sqlx::migrate::MigrateError> for DatabaseError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DatabaseError::MigrationError(err.to_string())
    }
}

/// Owner of the process-wide connection pool
pub struct DatabaseManager {
    pool: OnceLock<PgPool>,
}

impl DatabaseManager {
    fn instance() -> &'static DatabaseManager {
        static INSTANCE: OnceLock<DatabaseManager> = OnceLock::new();
        INSTANCE.get_or_init(|| DatabaseManager {
            pool: OnceLock::new(),
        })
    }

    /// Get the shared pool, building it on first use.
    ///
    /// The pool connects lazily, so this only fails when DATABASE_URL is
    /// missing or unparseable; connectivity problems show up on first query.
    pub fn pool() -> Result<PgPool, DatabaseError> {
        let manager = Self::instance();
        if let Some(pool) = manager.pool.get() {
            return Ok(pool.clone());
        }

        let pool = Self::build_pool()?;
        // A concurrent initialiser may have won; either pool is equivalent.
        Ok(manager.pool.get_or_init(|| pool).clone())
    }

    fn build_pool() -> Result<PgPool, DatabaseError> {
        let url = std::env::var("DATABASE_URL").map_err(|_| DatabaseError::ConfigMissing("DATABASE_URL"))?;
        let settings = &config::config().database;

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(Duration::from_secs(settings.connection_timeout))
            .connect_lazy(&url)?;

        info!("Created database pool (max {} connections)", settings.max_connections);
        Ok(pool)
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check() -> Result<(), DatabaseError> {
        let pool = Self::pool()?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok(())
    }

    /// Apply the embedded migrations in `migrations/`
    pub async fn migrate() -> Result<(), DatabaseError> {
        let pool = Self::pool()?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Close the pool (e.g., on shutdown)
    pub async fn close() {
        if let Some(pool) = Self::instance().pool.get() {
            pool.close().await;
            info!("Closed database pool");
        }
    }
}
