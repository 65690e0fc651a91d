//! # Database Handle
//!
//! Opens the local SQLite file that backs the key-value table.
//!
//! ```text
//!   DbConfig::new(path)  or  DbConfig::in_memory()
//!          │
//!          ▼
//!   Database::new(config) ── open pool ── apply migrations
//!          │
//!          ▼
//!   db.key_values() ──► SqliteKeyValueStore ──┬──► SessionStore
//!                                             └──► LocationStore
//! ```
//!
//! Only a handful of small JSON blobs live here, so the pool is small. File
//! databases use WAL journaling and a busy timeout so a reader never fails
//! while the session or location is being written.

use std::path::{Path, PathBuf};
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::kv::SqliteKeyValueStore;
use crate::migrations::{self, MigrationStatus};

// =============================================================================
// Configuration
// =============================================================================

/// Where the key-value table lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageLocation {
    /// A database file, created on first use.
    File(PathBuf),

    /// A private in-memory database, gone when the handle is dropped.
    Memory,
}

/// How to open the local database.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub location: StorageLocation,

    /// Default: 2 (one writer, one reader)
    pub max_connections: u32,

    /// How long a statement waits for a lock held by another connection.
    pub busy_timeout: Duration,

    /// Whether embedded migrations are applied on open.
    pub migrate: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            location: StorageLocation::File(path.into()),
            max_connections: 2,
            busy_timeout: Duration::from_secs(5),
            migrate: true,
        }
    }

    /// Each in-memory SQLite connection is its own database, so the pool is
    /// pinned to exactly one connection that is never recycled.
    pub fn in_memory() -> Self {
        DbConfig {
            location: StorageLocation::Memory,
            max_connections: 1,
            busy_timeout: Duration::from_secs(1),
            migrate: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }

    pub fn skip_migrations(mut self) -> Self {
        self.migrate = false;
        self
    }

    /// The database file, if any.
    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            StorageLocation::File(path) => Some(path),
            StorageLocation::Memory => None,
        }
    }

    fn connect_options(&self) -> SqliteConnectOptions {
        let options = SqliteConnectOptions::new().busy_timeout(self.busy_timeout);
        match &self.location {
            StorageLocation::File(path) => options
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal),
            StorageLocation::Memory => options.in_memory(true),
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the local database. Clones share one pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and, unless skipped, brings the schema up to date.
    pub async fn new(config: DbConfig) -> StoreResult<Self> {
        match config.path() {
            Some(path) => info!(path = %path.display(), "Opening local database"),
            None => info!("Opening in-memory database"),
        }

        let in_memory = config.location == StorageLocation::Memory;
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(if in_memory { 1 } else { 0 })
            .idle_timeout((!in_memory).then_some(Duration::from_secs(300)))
            .max_lifetime(None)
            .connect_with(config.connect_options())
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        debug!(max_connections = config.max_connections, "Pool ready");

        let db = Database { pool };
        if config.migrate {
            migrations::apply(&db.pool).await?;
        }
        Ok(db)
    }

    /// Opens a migrated in-memory database.
    pub async fn in_memory() -> StoreResult<Self> {
        Self::new(DbConfig::in_memory()).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The key-value table of this database.
    pub fn key_values(&self) -> SqliteKeyValueStore {
        SqliteKeyValueStore::new(self.pool.clone())
    }

    pub async fn migration_status(&self) -> StoreResult<MigrationStatus> {
        migrations::status(&self.pool).await
    }

    /// Closes the pool. Later operations fail with `ConnectionFailed`.
    pub async fn close(&self) {
        info!("Closing local database");
        self.pool.close().await;
    }

    /// Whether a trivial query still succeeds.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database_is_migrated() {
        let db = Database::in_memory().await.unwrap();
        assert!(db.health_check().await);

        let status = db.migration_status().await.unwrap();
        assert!(status.is_current());
        assert!(status.embedded >= 1);
    }

    #[tokio::test]
    async fn test_file_database_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dairy.db");

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        assert!(db.health_check().await);
        assert!(path.exists());

        db.close().await;
        assert!(!db.health_check().await);
    }

    #[tokio::test]
    async fn test_skip_migrations_leaves_schema_pending() {
        let db = Database::new(DbConfig::in_memory().skip_migrations())
            .await
            .unwrap();

        let status = db.migration_status().await.unwrap();
        assert_eq!(status.applied, 0);
        assert!(!status.is_current());
    }

    #[test]
    fn test_config_locations() {
        let file = DbConfig::new("/tmp/dairy.db").max_connections(0);
        assert_eq!(file.path(), Some(Path::new("/tmp/dairy.db")));
        assert_eq!(file.max_connections, 1);

        let memory = DbConfig::in_memory();
        assert_eq!(memory.path(), None);
        assert_eq!(memory.location, StorageLocation::Memory);
    }
}
