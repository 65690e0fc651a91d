//! # Schema Migrations
//!
//! SQL files under `migrations/sqlite/` are compiled into the binary and
//! applied in sequence order when the database opens. sqlx records each
//! applied version in `_sqlx_migrations`, so applying twice is a no-op.
//!
//! New schema changes go in a new `NNN_description.sql` file; applied files
//! are never edited.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::StoreResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Embedded versus applied migration counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationStatus {
    pub embedded: usize,
    pub applied: usize,
}

impl MigrationStatus {
    pub fn is_current(&self) -> bool {
        self.applied >= self.embedded
    }
}

pub(crate) async fn apply(pool: &SqlitePool) -> StoreResult<()> {
    MIGRATOR.run(pool).await?;
    info!(embedded = MIGRATOR.migrations.len(), "Schema up to date");
    Ok(())
}

pub(crate) async fn status(pool: &SqlitePool) -> StoreResult<MigrationStatus> {
    // The bookkeeping table only exists once a migration has run.
    let applied = match sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1",
    )
    .fetch_one(pool)
    .await
    {
        Ok(count) => usize::try_from(count).unwrap_or(0),
        Err(e) => {
            debug!(error = %e, "No migration history");
            0
        }
    };

    Ok(MigrationStatus {
        embedded: MIGRATOR.migrations.len(),
        applied,
    })
}
