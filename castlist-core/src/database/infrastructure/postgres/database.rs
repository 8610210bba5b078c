use std::{fmt, time::Duration};

use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions},
};
use tracing::info;

use super::persons::PostgresPersonsRepository;
use crate::error::{CatalogError, Result};

/// Statistics about the connection pool
#[derive(Debug, Clone)]
pub struct PoolStats {
    pub size: u32,
    pub idle: u32,
    pub max_size: u32,
    pub min_idle: u32,
}

/// Owner of the connection pool plus the repositories built on it.
#[derive(Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
    max_connections: u32,
    min_connections: u32,
    persons: PostgresPersonsRepository,
}

impl fmt::Debug for PostgresDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresDatabase")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .finish()
    }
}

impl PostgresDatabase {
    /// Connect to `connection_string`. Pool bounds default to the host CPU
    /// count and 5 idle connections.
    pub async fn connect(
        connection_string: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
    ) -> Result<Self> {
        let max_connections =
            max_connections.unwrap_or(num_cpus::get() as u32).max(1);
        let min_connections =
            min_connections.unwrap_or(5).min(max_connections);

        let connect_options = connection_string
            .trim()
            .parse::<PgConnectOptions>()
            .map_err(|e| {
                CatalogError::Internal(format!(
                    "Invalid PostgreSQL connection string: {}",
                    e
                ))
            })?;

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .max_lifetime(Duration::from_secs(1800))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect_with(connect_options)
            .await
            .map_err(|e| {
                CatalogError::Internal(format!(
                    "Database connection failed: {}",
                    e
                ))
            })?;

        info!(
            "Database pool initialized with max_connections={}, min_connections={}",
            max_connections, min_connections
        );

        Ok(Self::with_limits(pool, max_connections, min_connections))
    }

    /// Create a PostgresDatabase from an existing pool (mainly for testing)
    pub fn from_pool(pool: PgPool) -> Self {
        Self::with_limits(pool, 20, 5)
    }

    fn with_limits(pool: PgPool, max_connections: u32, min_connections: u32) -> Self {
        let persons = PostgresPersonsRepository::new(pool.clone());
        Self {
            pool,
            max_connections,
            min_connections,
            persons,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn persons(&self) -> PostgresPersonsRepository {
        self.persons.clone()
    }

    pub fn pool_stats(&self) -> PoolStats {
        PoolStats {
            size: self.pool.size(),
            idle: self.pool.num_idle() as u32,
            max_size: self.max_connections,
            min_idle: self.min_connections,
        }
    }

    /// Apply pending schema migrations.
    pub async fn initialize_schema(&self) -> Result<()> {
        crate::MIGRATOR.run(&self.pool).await.map_err(|e| {
            CatalogError::Internal(format!("Migration failed: {}", e))
        })?;
        info!("Database schema is up to date");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
