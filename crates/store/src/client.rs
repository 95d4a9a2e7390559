//! Store client wrapper.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use tracking_core::{DbErrorCode, Error, Result, SiteIdConfig};

use crate::config::StoreConfig;

/// SQLite-backed document store with connection pooling.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
    site_ids: SiteIdConfig,
}

impl Store {
    /// Opens the database, creating the file if needed.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(db_err)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(config.busy_timeout_secs));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.max_connections.min(1))
            .connect_with(options)
            .await
            .map_err(db_err)?;

        info!(url = %config.url, "Opened tracking store");

        Ok(Self {
            pool,
            site_ids: config.site_ids.clone(),
        })
    }

    /// Returns the inner pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Site identifier generation settings for this store.
    pub fn site_ids(&self) -> &SiteIdConfig {
        &self.site_ids
    }

    /// Connectivity probe for health checks.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

/// Map a driver error into the engine's coded store error.
pub(crate) fn db_err(e: sqlx::Error) -> Error {
    Error::database(DbErrorCode::StoreFailed, e.to_string())
}
