//! # dairy-store: Local Persistence for the Dairy Marketplace Client
//!
//! Everything the client keeps on the device between launches: the signed-in
//! session and the delivery address. Both are small string blobs in one
//! key-value table.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Persistence Data Flow                            │
//! │                                                                         │
//! │  AuthService / CheckoutWorkflow (dairy-client)                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   dairy-store (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │    Stores     │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ LocationStore │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ SessionStore  │    │ 001_key_     │  │   │
//! │  │   │               │ kv │               │    │   value.sql  │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   <platform data dir>/dairy.db   (or DAIRY_DB_PATH)             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`kv`] - `KeyValueStore` trait with SQLite and in-memory backends
//! - [`location`] - Delivery location store
//! - [`session`] - Session persistence and verified sign-out
//! - [`error`] - Store error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use dairy_store::{Database, DbConfig, LocationStore};
//!
//! let db = Database::new(DbConfig::new("dairy.db")).await?;
//! let locations = LocationStore::new(Arc::new(db.key_values()));
//! let current = locations.load().await;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod kv;
pub mod location;
pub mod migrations;
pub mod pool;
pub mod session;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{StoreError, StoreResult};
pub use kv::{keys, KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};
pub use location::LocationStore;
pub use migrations::MigrationStatus;
pub use pool::{Database, DbConfig, StorageLocation};
pub use session::SessionStore;
