//! # Dairy Storefront
//!
//! Startup and store wiring for the marketplace shell. The shell calls
//! [`init_tracing`] once, then [`open`] to get an [`AppContext`] and drives
//! screens through it.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Application Startup                               │
//! │                                                                         │
//! │  1. Initialize Logging ───────────────────────────────────────────────► │
//! │     • tracing-subscriber with env filter                                │
//! │     • Default: INFO, dairy crates at DEBUG, RUST_LOG overrides          │
//! │                                                                         │
//! │  2. Load Configuration ───────────────────────────────────────────────► │
//! │     • storefront.toml, then DAIRY_* environment variables               │
//! │                                                                         │
//! │  3. Determine Database Path ──────────────────────────────────────────► │
//! │     • DAIRY_DB_PATH, else the platform data directory                   │
//! │                                                                         │
//! │  4. Connect to Database ──────────────────────────────────────────────► │
//! │     • SQLite with WAL mode                                              │
//! │     • Run pending migrations                                            │
//! │                                                                         │
//! │  5. Build AppContext ─────────────────────────────────────────────────► │
//! │     • Session and location stores over the key-value table              │
//! │     • API client, auth, orders, empty cart                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod state;

use std::path::PathBuf;
use std::sync::Arc;

use dairy_client::{ClientConfig, NoticeSink};
use dairy_store::DbConfig;
use directories::ProjectDirs;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub use error::{AppError, AppResult, ErrorCode};
pub use state::{AppContext, CartState, CartTotals};

/// Environment variable overriding the database location.
pub const DB_PATH_ENV: &str = "DAIRY_DB_PATH";

/// Loads configuration, opens the database and builds the context.
///
/// `config_path` falls back to the platform config directory.
pub async fn open(
    config_path: Option<PathBuf>,
    notices: Arc<dyn NoticeSink>,
) -> AppResult<AppContext> {
    info!("Starting dairy storefront");

    let config = ClientConfig::load(config_path)?;
    let db_path = database_path()?;
    info!(?db_path, "Database path determined");

    AppContext::new(config, DbConfig::new(db_path), notices).await
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=dairy=trace` - Show trace for dairy crates only
/// - Default: INFO, DEBUG for dairy crates
///
/// Calling this twice leaves the first subscriber in place.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,dairy=debug,sqlx=warn"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Determines the database file path.
///
/// ## Platform-Specific Paths
/// - **macOS**: `~/Library/Application Support/ke.dairy.storefront/dairy.db`
/// - **Windows**: `%APPDATA%\dairy\storefront\data\dairy.db`
/// - **Linux**: `~/.local/share/storefront/dairy.db`
///
/// ## Development Override
/// Set `DAIRY_DB_PATH` to use a custom path.
pub fn database_path() -> AppResult<PathBuf> {
    database_path_from(|key| std::env::var(key).ok())
}

fn database_path_from<F>(lookup: F) -> AppResult<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup(DB_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }

    let dirs = ProjectDirs::from("ke", "dairy", "storefront")
        .ok_or_else(|| AppError::internal("Could not determine app data directory"))?;
    let data_dir = dirs.data_dir();

    std::fs::create_dir_all(data_dir).map_err(|e| {
        AppError::new(
            ErrorCode::StorageError,
            format!("Could not create {}: {e}", data_dir.display()),
        )
    })?;

    Ok(data_dir.join("dairy.db"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_path_override() {
        let path = database_path_from(|key| {
            (key == DB_PATH_ENV).then(|| "/tmp/custom/dairy.db".to_string())
        })
        .unwrap();

        assert_eq!(path, PathBuf::from("/tmp/custom/dairy.db"));
    }

    #[test]
    fn test_init_tracing_twice_is_harmless() {
        init_tracing();
        init_tracing();
    }
}
