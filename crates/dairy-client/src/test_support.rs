//! Fixtures shared by the wiremock-backed tests.

use std::sync::Arc;

use dairy_core::types::{ProfileRef, RoleRecord, Session, UserRecord};
use dairy_store::{MemoryKeyValueStore, SessionStore};
use wiremock::MockServer;

use crate::api::ApiClient;
use crate::config::ApiSettings;

/// An API client pointed at `server`, with an empty in-memory session.
pub(crate) fn client_for(server: &MockServer) -> (ApiClient, Arc<SessionStore>) {
    let session = Arc::new(SessionStore::new(Arc::new(MemoryKeyValueStore::new())));
    let settings = ApiSettings {
        base_url: format!("{}/api/", server.uri()),
        timeout_secs: 5,
    };
    let client = ApiClient::new(&settings, session.clone()).expect("valid mock server url");
    (client, session)
}

pub(crate) fn customer_user() -> UserRecord {
    UserRecord {
        id: 9,
        name: "Wanjiru".into(),
        email: "wanjiru@example.com".into(),
        roles: vec![RoleRecord {
            slug: "customer".into(),
            name: Some("Customer".into()),
        }],
        customer: Some(ProfileRef { id: 44 }),
        supplier: None,
        driver: None,
    }
}

/// A signed-in customer with token `token-abc`.
pub(crate) fn customer_session() -> Session {
    Session::new(customer_user(), "token-abc")
}
