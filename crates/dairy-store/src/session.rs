//! # Session Store
//!
//! Persists the signed-in session as three independent entries.
//!
//! ```text
//! ┌──────────────┬──────────────────────────────────────────────┐
//! │ key          │ value                                        │
//! ├──────────────┼──────────────────────────────────────────────┤
//! │ userData     │ {"id":9,"name":"...","roles":[...],...}      │
//! │ userToken    │ eyJhbGciOi...  (raw, not JSON)               │
//! │ userRoles    │ ["customer"]                                 │
//! └──────────────┴──────────────────────────────────────────────┘
//! ```
//!
//! ## Sign-Out Guarantee
//! `clear()` attempts every removal even if an earlier one fails, then reads
//! each key back. Any key that could not be removed, or is still readable,
//! is reported in [`StoreError::PartialClear`].

use std::sync::Arc;

use dairy_core::types::{Session, UserRecord};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::kv::{keys, KeyValueStore};

/// Accepts both the slug list this crate writes and the role objects older
/// shells stored under `userRoles`.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredRole {
    Slug(String),
    Record { slug: String },
}

impl StoredRole {
    fn into_slug(self) -> String {
        match self {
            StoredRole::Slug(slug) | StoredRole::Record { slug } => slug,
        }
    }
}

pub struct SessionStore {
    kv: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Writes user, token and roles.
    pub async fn save(&self, session: &Session) -> StoreResult<()> {
        let user = encode(keys::USER_DATA, &session.user)?;
        let roles = encode(keys::USER_ROLES, &session.roles)?;

        self.kv.set(keys::USER_DATA, &user).await?;
        self.kv.set(keys::USER_TOKEN, &session.access_token).await?;
        self.kv.set(keys::USER_ROLES, &roles).await?;

        info!(user_id = session.user.id, roles = ?session.roles, "Session stored");
        Ok(())
    }

    /// Loads the stored session.
    ///
    /// Returns `Ok(None)` when any of the three entries is missing or
    /// unreadable; a half-written session counts as signed out.
    pub async fn load(&self) -> StoreResult<Option<Session>> {
        let Some(token) = self.token().await? else {
            return Ok(None);
        };
        let Some(user) = self.user().await? else {
            return Ok(None);
        };
        let Some(raw_roles) = self.kv.get(keys::USER_ROLES).await? else {
            return Ok(None);
        };

        let roles = match serde_json::from_str::<Vec<StoredRole>>(&raw_roles) {
            Ok(roles) => roles.into_iter().map(StoredRole::into_slug).collect(),
            Err(e) => {
                warn!(error = %e, "Stored roles are malformed");
                return Ok(None);
            }
        };

        Ok(Some(Session {
            user,
            access_token: token,
            roles,
        }))
    }

    /// The bearer token, if one is stored.
    pub async fn token(&self) -> StoreResult<Option<String>> {
        Ok(self
            .kv
            .get(keys::USER_TOKEN)
            .await?
            .filter(|t| !t.is_empty()))
    }

    /// The stored user record. Malformed data reads as absent.
    pub async fn user(&self) -> StoreResult<Option<UserRecord>> {
        let Some(json) = self.kv.get(keys::USER_DATA).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&json) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!(error = %e, "Stored user record is malformed");
                Ok(None)
            }
        }
    }

    /// Removes all session entries and verifies they are gone.
    pub async fn clear(&self) -> StoreResult<()> {
        let mut remaining = Vec::new();

        for key in keys::SESSION {
            if let Err(e) = self.kv.remove(key).await {
                error!(key = %key, error = %e, "Failed to remove session entry");
                remaining.push(key.to_string());
            }
        }

        for key in keys::SESSION {
            if remaining.iter().any(|k| k == key) {
                continue;
            }
            match self.kv.get(key).await {
                Ok(None) => {}
                Ok(Some(_)) => {
                    error!(key = %key, "Session entry still present after removal");
                    remaining.push(key.to_string());
                }
                Err(e) => {
                    error!(key = %key, error = %e, "Could not verify session entry removal");
                    remaining.push(key.to_string());
                }
            }
        }

        if remaining.is_empty() {
            info!("Session cleared");
            Ok(())
        } else {
            Err(StoreError::PartialClear { keys: remaining })
        }
    }
}

fn encode<T: serde::Serialize>(key: &str, value: &T) -> StoreResult<String> {
    serde_json::to_string(value).map_err(|e| StoreError::Encode {
        key: key.to_string(),
        reason: e.to_string(),
    })
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
    use dairy_core::types::{ProfileRef, RoleRecord};

    fn session() -> Session {
        let user = UserRecord {
            id: 9,
            name: "Wanjiru".into(),
            email: "wanjiru@example.com".into(),
            roles: vec![RoleRecord {
                slug: "customer".into(),
                name: None,
            }],
            customer: Some(ProfileRef { id: 44 }),
            supplier: None,
            driver: None,
        };
        Session::new(user, "token-abc")
    }

    /// Memory store whose removals fail for selected keys, and which can keep
    /// a key readable even after a "successful" removal.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryKeyValueStore,
        fail_remove: Vec<&'static str>,
        sticky: Vec<&'static str>,
    }

    #[async_trait]
    impl KeyValueStore for FlakyStore {
        async fn get(&self, key: &str) -> StoreResult<Option<String>> {
            self.inner.get(key).await
        }
        async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
            self.inner.set(key, value).await
        }
        async fn remove(&self, key: &str) -> StoreResult<()> {
            if self.fail_remove.iter().any(|k| *k == key) {
                return Err(StoreError::QueryFailed("locked".into()));
            }
            if self.sticky.iter().any(|k| *k == key) {
                return Ok(());
            }
            self.inner.remove(key).await
        }
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let db = Database::in_memory().await.unwrap();
        let store = SessionStore::new(Arc::new(db.key_values()));

        store.save(&session()).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, session());
        assert_eq!(store.token().await.unwrap().as_deref(), Some("token-abc"));
    }

    #[tokio::test]
    async fn test_token_is_stored_raw() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        SessionStore::new(kv.clone()).save(&session()).await.unwrap();

        assert_eq!(
            kv.get(keys::USER_TOKEN).await.unwrap().as_deref(),
            Some("token-abc")
        );
        assert_eq!(
            kv.get(keys::USER_ROLES).await.unwrap().as_deref(),
            Some(r#"["customer"]"#)
        );
    }

    #[tokio::test]
    async fn test_load_accepts_role_objects() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let store = SessionStore::new(kv.clone());
        store.save(&session()).await.unwrap();
        kv.set(keys::USER_ROLES, r#"[{"id":1,"slug":"driver"}]"#)
            .await
            .unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.roles, vec!["driver".to_string()]);
    }

    #[tokio::test]
    async fn test_load_missing_entry_is_signed_out() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let store = SessionStore::new(kv.clone());
        store.save(&session()).await.unwrap();
        kv.remove(keys::USER_DATA).await.unwrap();

        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let store = SessionStore::new(kv.clone());
        store.save(&session()).await.unwrap();
        kv.set(keys::LOCATION_DETAILS, "{}").await.unwrap();

        store.clear().await.unwrap();

        assert_eq!(store.load().await.unwrap(), None);
        // The delivery location is not part of the session.
        assert_eq!(kv.len().await, 1);
    }

    #[tokio::test]
    async fn test_clear_reports_failed_removal_and_continues() {
        let kv = Arc::new(FlakyStore {
            fail_remove: vec![keys::USER_TOKEN],
            ..Default::default()
        });
        let store = SessionStore::new(kv.clone());
        store.save(&session()).await.unwrap();

        let err = store.clear().await.unwrap_err();
        match err {
            StoreError::PartialClear { keys: remaining } => {
                assert_eq!(remaining, vec![keys::USER_TOKEN.to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }

        // Later removals still ran.
        assert_eq!(kv.get(keys::USER_DATA).await.unwrap(), None);
        assert_eq!(kv.get(keys::USER_ROLES).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_detects_entry_still_readable() {
        let kv = Arc::new(FlakyStore {
            sticky: vec![keys::USER_ROLES],
            ..Default::default()
        });
        let store = SessionStore::new(kv);
        store.save(&session()).await.unwrap();

        let err = store.clear().await.unwrap_err();
        assert!(
            matches!(err, StoreError::PartialClear { ref keys } if keys == &vec!["userRoles".to_string()])
        );
    }
}
