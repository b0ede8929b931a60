//! Database layer for Citegraph
//!
//! Provides:
//! - SeaORM entity models
//! - Repository pattern for data access
//! - Connection pool management
//! - Idempotent schema bootstrap from the entity definitions

pub mod models;
mod repository;

pub use repository::{NewCollection, Repository, SavedPaperUpdate};

use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use models::*;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema,
};
use std::time::Duration;
use tracing::info;

/// Database connection pool wrapper
#[derive(Clone)]
pub struct DbPool {
    /// Primary connection (for writes)
    pub primary: DatabaseConnection,

    /// Read replica connection (optional)
    pub replica: Option<DatabaseConnection>,
}

impl DbPool {
    /// Create a new database pool from configuration
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to primary database...");

        let primary = Self::connect(&config.url, config, "primary").await?;

        // Connect to replica if configured
        let replica = if let Some(ref read_url) = config.read_url {
            info!("Connecting to read replica...");
            Some(Self::connect(read_url, config, "replica").await?)
        } else {
            None
        };

        info!("Database connections established");

        Ok(Self { primary, replica })
    }

    /// Single-connection in-memory SQLite database with the schema applied
    pub async fn in_memory() -> Result<Self> {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            idle_timeout_secs: 3600,
            ..DatabaseConfig::default()
        };

        let pool = Self::new(&config).await?;
        migrate(pool.write()).await?;
        Ok(pool)
    }

    async fn connect(url: &str, config: &DatabaseConfig, role: &str) -> Result<DatabaseConnection> {
        let mut opts = ConnectOptions::new(url);
        opts
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .sqlx_logging(config.sql_logging);

        Database::connect(opts)
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Failed to connect to {}: {}", role, e)
            })
    }

    /// Get the connection for reads (replica if available, otherwise primary)
    pub fn read(&self) -> &DatabaseConnection {
        self.replica.as_ref().unwrap_or(&self.primary)
    }

    /// Get the connection for writes (always primary)
    pub fn write(&self) -> &DatabaseConnection {
        &self.primary
    }

    /// Ping the database to check connectivity
    pub async fn ping(&self) -> Result<()> {
        self.primary
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Primary ping failed: {}", e),
            })?;

        if let Some(ref replica) = self.replica {
            replica
                .execute_unprepared("SELECT 1")
                .await
                .map_err(|e| AppError::DatabaseConnection {
                    message: format!("Replica ping failed: {}", e),
                })?;
        }

        Ok(())
    }
}

/// Create every table and index that does not exist yet.
///
/// Tables are created parents first so foreign keys resolve on both SQLite
/// and Postgres.
pub async fn migrate(conn: &DatabaseConnection) -> Result<()> {
    create_table(conn, PaperEntity).await?;
    create_table(conn, AuthorEntity).await?;
    create_table(conn, PaperAuthorEntity).await?;
    create_table(conn, CitationEntity).await?;
    create_table(conn, CollectionEntity).await?;
    create_table(conn, SavedPaperEntity).await?;

    info!("Database schema is up to date");
    Ok(())
}

async fn create_table<E: EntityTrait>(conn: &DatabaseConnection, entity: E) -> Result<()> {
    let backend = conn.get_database_backend();
    let schema = Schema::new(backend);

    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    conn.execute(backend.build(&table)).await?;

    for mut index in schema.create_index_from_entity(entity) {
        index.if_not_exists();
        conn.execute(backend.build(&index)).await?;
    }

    Ok(())
}
