//! # Location Store
//!
//! Holds the delivery address and persists it under `locationDetails`.
//!
//! ## Load / Save
//! ```text
//!   load()                              save(location)
//!     │                                   │
//!     ▼                                   ▼
//!   kv.get("locationDetails")           serde_json::to_string
//!     │                                   │
//!     ├── None ─────────► empty           ▼
//!     ├── bad JSON ─────► empty + warn  kv.set("locationDetails")
//!     ├── read error ───► empty + warn    │
//!     └── Some(json) ───► parsed          ├── Err ──► in-memory unchanged
//!                                         └── Ok ───► in-memory replaced
//! ```
//!
//! Saving replaces the whole value; fields are never merged with what was
//! there before.

use std::sync::Arc;

use dairy_core::types::{DeliveryLocation, LocationField};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::{StoreError, StoreResult};
use crate::kv::{keys, KeyValueStore};

pub struct LocationStore {
    kv: Arc<dyn KeyValueStore>,
    current: RwLock<DeliveryLocation>,
}

impl LocationStore {
    /// Creates a store with an empty location. Call [`load`](Self::load) to
    /// pick up a previously saved one.
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            current: RwLock::new(DeliveryLocation::default()),
        }
    }

    /// Reads the persisted location into memory and returns it.
    ///
    /// Never fails: anything unreadable yields an empty location.
    pub async fn load(&self) -> DeliveryLocation {
        let loaded = match self.kv.get(keys::LOCATION_DETAILS).await {
            Ok(Some(json)) => match serde_json::from_str::<DeliveryLocation>(&json) {
                Ok(location) => location,
                Err(e) => {
                    warn!(error = %e, "Stored location is malformed, starting empty");
                    DeliveryLocation::default()
                }
            },
            Ok(None) => DeliveryLocation::default(),
            Err(e) => {
                warn!(error = %e, "Could not read stored location, starting empty");
                DeliveryLocation::default()
            }
        };

        *self.current.write().await = loaded.clone();
        loaded
    }

    /// Persists `location` and then makes it the in-memory value.
    pub async fn save(&self, location: DeliveryLocation) -> StoreResult<()> {
        let json = serde_json::to_string(&location).map_err(|e| StoreError::Encode {
            key: keys::LOCATION_DETAILS.to_string(),
            reason: e.to_string(),
        })?;

        self.kv.set(keys::LOCATION_DETAILS, &json).await?;

        info!(city = %location.city, "Delivery location saved");
        *self.current.write().await = location;
        Ok(())
    }

    /// Replaces the in-memory location without persisting it.
    pub async fn set_location(&self, location: DeliveryLocation) {
        *self.current.write().await = location;
    }

    /// Edits one field of the in-memory location without persisting it.
    pub async fn update_field(&self, field: LocationField, value: impl Into<String>) {
        self.current.write().await.set_field(field, value);
    }

    pub async fn location(&self) -> DeliveryLocation {
        self.current.read().await.clone()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKeyValueStore;
    use crate::pool::Database;
    use async_trait::async_trait;

    fn nairobi() -> DeliveryLocation {
        DeliveryLocation {
            city: "Nairobi".into(),
            road: "Ngong Road".into(),
            street: "Argwings Kodhek".into(),
            building: "Hurlingham Plaza".into(),
            house_number: "4C".into(),
        }
    }

    /// Reads succeed, writes fail.
    struct ReadOnlyStore;

    #[async_trait]
    impl KeyValueStore for ReadOnlyStore {
        async fn get(&self, _key: &str) -> StoreResult<Option<String>> {
            Ok(None)
        }
        async fn set(&self, _key: &str, _value: &str) -> StoreResult<()> {
            Err(StoreError::QueryFailed("disk full".into()))
        }
        async fn remove(&self, _key: &str) -> StoreResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let db = Database::in_memory().await.unwrap();
        let kv: Arc<dyn KeyValueStore> = Arc::new(db.key_values());

        let store = LocationStore::new(kv.clone());
        store.save(nairobi()).await.unwrap();
        assert_eq!(store.location().await, nairobi());

        // A fresh store over the same storage sees the saved value.
        let fresh = LocationStore::new(kv);
        assert_eq!(fresh.load().await, nairobi());
    }

    #[tokio::test]
    async fn test_load_absent_is_empty() {
        let store = LocationStore::new(Arc::new(MemoryKeyValueStore::new()));
        assert_eq!(store.load().await, DeliveryLocation::default());
    }

    #[tokio::test]
    async fn test_load_malformed_is_empty() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        kv.set(keys::LOCATION_DETAILS, "{not json").await.unwrap();

        let store = LocationStore::new(kv);
        store.set_location(nairobi()).await;

        assert_eq!(store.load().await, DeliveryLocation::default());
        assert_eq!(store.location().await, DeliveryLocation::default());
    }

    #[tokio::test]
    async fn test_save_replaces_wholesale() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let store = LocationStore::new(kv.clone());
        store.save(nairobi()).await.unwrap();

        let only_city = DeliveryLocation {
            city: "Kisumu".into(),
            ..Default::default()
        };
        store.save(only_city.clone()).await.unwrap();

        assert_eq!(store.location().await, only_city);
        let stored = kv.get(keys::LOCATION_DETAILS).await.unwrap().unwrap();
        let stored: DeliveryLocation = serde_json::from_str(&stored).unwrap();
        assert_eq!(stored.road, "");
    }

    #[tokio::test]
    async fn test_failed_save_keeps_memory() {
        let store = LocationStore::new(Arc::new(ReadOnlyStore));
        store.set_location(nairobi()).await;

        let other = DeliveryLocation {
            city: "Mombasa".into(),
            ..Default::default()
        };
        assert!(store.save(other).await.is_err());
        assert_eq!(store.location().await, nairobi());
    }

    #[tokio::test]
    async fn test_update_field_is_transient() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let store = LocationStore::new(kv.clone());

        store.update_field(LocationField::City, "Nyeri").await;
        assert_eq!(store.location().await.city, "Nyeri");
        assert_eq!(kv.get(keys::LOCATION_DETAILS).await.unwrap(), None);
    }
}
