//! Connection pool wrapper.

use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::path::Path;

use super::config::DatabaseConfig;
use super::errors::map_error;
use crate::errors::{Details, Reason, ServiceError};
use crate::http::Readiness;

/// A PostgreSQL pool whose failures surface as `ServiceError`s.
#[derive(Debug, Clone)]
pub struct Pool {
    inner: PgPool,
}

fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .max_lifetime(config.max_lifetime())
        .idle_timeout(config.idle_timeout())
        .acquire_timeout(config.acquire_timeout())
}

impl Pool {
    /// Open the pool and establish the first connection.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, ServiceError> {
        let options = config.connect_options()?;
        let inner = pool_options(config)
            .connect_with(options)
            .await
            .map_err(|err| map_error(&err))?;

        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            max_connections = config.max_connections,
            "database pool connected"
        );
        Ok(Self { inner })
    }

    /// Build the pool without connecting; connections open on first use.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, ServiceError> {
        let options = config.connect_options()?;
        Ok(Self {
            inner: pool_options(config).connect_lazy_with(options),
        })
    }

    /// Apply pending forward-only migrations from `path`. Nothing to apply is success.
    pub async fn migrate(&self, path: impl AsRef<Path>) -> Result<(), ServiceError> {
        let path = path.as_ref();
        let migration_error = |err: sqlx::migrate::MigrateError| {
            ServiceError::internal(err.to_string())
                .with_reason(Reason::INTERNAL)
                .with_details(Details::new().with_field("migrations", path.display().to_string()))
        };

        let migrator = Migrator::new(path.to_path_buf())
            .await
            .map_err(migration_error)?;
        migrator.run(&self.inner).await.map_err(migration_error)?;

        tracing::info!(path = %path.display(), migrations = migrator.iter().count(), "database migrations applied");
        Ok(())
    }

    pub fn inner(&self) -> &PgPool {
        &self.inner
    }

    /// Close every connection and wait for them to be released.
    pub async fn close(&self) {
        self.inner.close().await;
        tracing::info!("database pool closed");
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

#[async_trait]
impl Readiness for Pool {
    async fn ready(&self) -> bool {
        match sqlx::query("SELECT 1").execute(&self.inner).await {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(error = %err, "database is not ready");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lazy_pool_does_not_connect() {
        let config = DatabaseConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            ..DatabaseConfig::default()
        };
        let pool = Pool::connect_lazy(&config).unwrap();
        assert!(!pool.is_closed());
        assert_eq!(pool.inner().size(), 0);

        pool.close().await;
        assert!(pool.is_closed());
    }

    #[tokio::test]
    async fn closed_pool_is_not_ready() {
        let pool = Pool::connect_lazy(&DatabaseConfig::default()).unwrap();
        pool.close().await;
        assert!(!pool.ready().await);
    }

    #[tokio::test]
    async fn missing_migrations_directory() {
        let pool = Pool::connect_lazy(&DatabaseConfig::default()).unwrap();
        let err = pool.migrate("/nonexistent/migrations").await.unwrap_err();
        assert_eq!(err.code(), crate::errors::Code::Internal);
    }
}
