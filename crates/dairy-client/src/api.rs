//! # REST Transport
//!
//! A thin wrapper over `reqwest` shared by every service in this crate.
//!
//! ## Request Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  get / post / patch                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  base_url + path  (+ query pairs)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SessionStore::token() ── Some ──► Authorization: Bearer <userToken>    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  send (timeout from ApiSettings)                                        │
//! │       │                                                                 │
//! │       ├── 2xx ──────────► JSON body ──► T          (Decode on mismatch) │
//! │       ├── 429 ──────────► ClientError::RateLimited                      │
//! │       └── other ────────► ClientError::Http { status, body.message }    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here retries. Callers that want 429 handling wrap the call in
//! [`retry_rate_limited`](crate::retry::retry_rate_limited).

use std::sync::Arc;

use dairy_core::PageMeta;
use dairy_store::SessionStore;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ApiSettings;
use crate::error::{ClientError, ClientResult};

// =============================================================================
// Response Envelopes
// =============================================================================

/// `{status, message, data}` as returned by the auth endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub message: Option<String>,

    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("success")
    }

    /// Returns the server message and payload when `status == "success"`,
    /// otherwise a [`ClientError::Rejected`] carrying the server message.
    pub fn into_success(self, endpoint: &str) -> ClientResult<(String, T)> {
        let message = self.message.unwrap_or_default();
        if self.status.as_deref() != Some("success") {
            return Err(ClientError::Rejected { message });
        }
        let data = self.data.ok_or_else(|| ClientError::Decode {
            endpoint: endpoint.to_string(),
            reason: "missing data".to_string(),
        })?;
        Ok((message, data))
    }
}

/// `{data: T}` as returned by create and detail endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,

    #[serde(default)]
    pub message: Option<String>,
}

/// `{data: [...], meta: {...}}` as returned by list endpoints. Unpaginated
/// lists omit `meta`.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,

    #[serde(default)]
    pub meta: Option<PageMeta>,
}

/// The identifier block every create endpoint answers with.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Created {
    #[serde(rename = "_pid", deserialize_with = "pid_string")]
    pub pid: String,
}

/// Accepts `_pid` as a string or a number.
fn pid_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Pid {
        Text(String),
        Number(u64),
    }
    Ok(match Pid::deserialize(deserializer)? {
        Pid::Text(s) => s,
        Pid::Number(n) => n.to_string(),
    })
}

/// Error bodies usually carry a `message`.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

// =============================================================================
// API Client
// =============================================================================

/// Shared HTTP client bound to one API root.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl ApiClient {
    /// Builds the client; the session store supplies the bearer token.
    pub fn new(settings: &ApiSettings, session: Arc<SessionStore>) -> ClientResult<Self> {
        url::Url::parse(&settings.base_url)?;

        let http = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> ClientResult<T> {
        self.send::<(), T>(Method::GET, path, query, None).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.send(Method::POST, path, &[], Some(body)).await
    }

    pub async fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.send(Method::PATCH, path, &[], Some(body)).await
    }

    async fn send<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&B>,
    ) -> ClientResult<T> {
        let mut request = self.http.request(method.clone(), self.url(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        match self.session.token().await {
            Ok(Some(token)) => request = request.bearer_auth(token),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Could not read stored token, sending unauthenticated"),
        }

        debug!(%method, path, params = query.len(), "Sending request");
        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!(%method, path, "Rate limited");
            return Err(ClientError::RateLimited);
        }

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&bytes)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_default();
            warn!(%method, path, status = status.as_u16(), message = %message, "Request failed");
            return Err(ClientError::Http {
                status: status.as_u16(),
                message,
            });
        }

        debug!(%method, path, status = status.as_u16(), "Request succeeded");
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode {
            endpoint: path.to_string(),
            reason: e.to_string(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{client_for, customer_session};
    use serde_json::{json, Value};
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_envelope_success() {
        let envelope: Envelope<Value> = serde_json::from_value(json!({
            "status": "success",
            "message": "Welcome back",
            "data": {"x": 1}
        }))
        .unwrap();
        assert!(envelope.is_success());
        let (message, data) = envelope.into_success("/auth/sign-in").unwrap();
        assert_eq!(message, "Welcome back");
        assert_eq!(data, json!({"x": 1}));
    }

    #[test]
    fn test_envelope_failure_carries_message() {
        let envelope: Envelope<Value> = serde_json::from_value(json!({
            "status": "error",
            "message": "Invalid credentials"
        }))
        .unwrap();
        let err = envelope.into_success("/auth/sign-in").unwrap_err();
        assert!(matches!(err, ClientError::Rejected { ref message } if message == "Invalid credentials"));
    }

    #[test]
    fn test_created_accepts_numeric_pid() {
        let created: Created = serde_json::from_value(json!({"_pid": 981})).unwrap();
        assert_eq!(created.pid, "981");
        let created: Created = serde_json::from_value(json!({"_pid": "ORD-7"})).unwrap();
        assert_eq!(created.pid, "ORD-7");
    }

    #[tokio::test]
    async fn test_get_sends_query_and_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/produce/category"))
            .and(query_param("page[number]", "2"))
            .and(header("authorization", "Bearer token-abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .expect(1)
            .mount(&server)
            .await;

        let (client, session) = client_for(&server);
        session.save(&customer_session()).await.unwrap();

        let page: Page<Value> = client
            .get(
                "/produce/category",
                &[("page[number]".to_string(), "2".to_string())],
            )
            .await
            .unwrap();
        assert!(page.data.is_empty());
        assert!(page.meta.is_none());
    }

    #[tokio::test]
    async fn test_no_token_means_no_authorization_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/forgot-password"))
            .and(body_json(json!({"email": "a@b.co"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
            .mount(&server)
            .await;

        let (client, _) = client_for(&server);
        let _: Envelope<Value> = client
            .post("/auth/forgot-password", &json!({"email": "a@b.co"}))
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].headers.contains_key("authorization"));
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(path("/api/busy"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        Mock::given(path("/api/broken"))
            .respond_with(
                ResponseTemplate::new(422).set_body_json(json!({"message": "quantity is invalid"})),
            )
            .mount(&server)
            .await;
        Mock::given(path("/api/garbled"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let (client, _) = client_for(&server);

        let err = client.get::<Value>("/busy", &[]).await.unwrap_err();
        assert!(matches!(err, ClientError::RateLimited));

        let err = client.get::<Value>("/broken", &[]).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Http { status: 422, ref message } if message == "quantity is invalid"
        ));

        let err = client.get::<Value>("/garbled", &[]).await.unwrap_err();
        assert!(matches!(err, ClientError::Decode { ref endpoint, .. } if endpoint == "/garbled"));
    }
}
