//! # Auth Service
//!
//! Sign-in, sign-up, sign-out and password reset against the auth endpoints,
//! with the resulting session kept in the [`SessionStore`].
//!
//! ## Sign-In Flow
//! ```text
//!   sign_in(email, password)
//!       │
//!       ├── validate_email / validate_password ── Err ──► Validation (no request)
//!       │
//!       ▼
//!   POST /auth/sign-in {email, password}          (sent once, never retried)
//!       │
//!       ├── status != "success" ─────────────────────► Rejected { server message }
//!       │
//!       ▼
//!   SessionStore::save  (userData, userToken, userRoles)
//!       │
//!       ▼
//!   Ok(server message)
//! ```
//!
//! Every outcome is also raised on the [`NoticeSink`]: a success notice with
//! the server's message, a warning for input that failed validation, an
//! error otherwise.

use std::sync::Arc;

use dairy_core::types::{Session, UserRecord};
use dairy_core::validation::{
    validate_email, validate_name, validate_new_password, validate_password, validate_role,
};
use dairy_core::{Notice, RoutingTable};
use dairy_store::SessionStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::api::{ApiClient, Envelope};
use crate::error::{ClientError, ClientResult};
use crate::notify::NoticeSink;

/// `data` of a successful sign-in or sign-up.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthPayload {
    user: UserRecord,
    access_token: String,
}

#[derive(Serialize)]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignUpRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
    role: &'a str,
}

#[derive(Serialize)]
struct ForgotPasswordRequest<'a> {
    email: &'a str,
}

const SIGNED_OUT: &str = "You have been successfully logged out.";

pub struct AuthService {
    api: Arc<ApiClient>,
    session: Arc<SessionStore>,
    notices: Arc<dyn NoticeSink>,
}

impl AuthService {
    pub fn new(
        api: Arc<ApiClient>,
        session: Arc<SessionStore>,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        Self {
            api,
            session,
            notices,
        }
    }

    /// Signs in and stores the session. Returns the server's message.
    pub async fn sign_in(&self, email: &str, password: &str) -> ClientResult<String> {
        let result = self.request_sign_in(email, password).await;
        self.report(result)
    }

    async fn request_sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: &str,
    ) -> ClientResult<String> {
        let result = self.request_sign_up(name, email, password, role).await;
        self.report(result)
    }

    /// Removes the stored session. Fails with
    /// [`ClientError::PartialSignOut`](crate::error::ClientError::PartialSignOut)
    /// if any entry is left behind.
    pub async fn sign_out(&self) -> ClientResult<()> {
        let result = self.session.clear().await.map_err(ClientError::from);
        self.report(result.map(|()| SIGNED_OUT.to_string()))?;
        info!("Signed out");
        Ok(())
    }

    /// Requests a password reset link. Returns the server's message.
    pub async fn forgot_password(&self, email: &str) -> ClientResult<String> {
        let result = self.request_password_reset(email).await;
        self.report(result)
    }

    fn report(&self, result: ClientResult<String>) -> ClientResult<String> {
        let notice = match &result {
            Ok(message) if message.is_empty() => return result,
            Ok(message) => Notice::success(message.as_str()),
            Err(e) if e.is_validation() => Notice::warning(e.user_message()),
            Err(e) => Notice::error(e.user_message()),
        };
        self.notices.notify(notice);
        result
    }

    // =========================================================================
    // Requests
    // =========================================================================

    async fn request_sign_in(&self, email: &str, password: &str) -> ClientResult<String> {
        validate_email(email)?;
        validate_password(password)?;

        let envelope: Envelope<AuthPayload> = self
            .api
            .post("/auth/sign-in", &SignInRequest { email, password })
            .await?;
        self.store_session(envelope, "/auth/sign-in").await
    }

    /// Registers a new account with one of the sign-up roles and stores the
    /// session. Returns the server's message.
    pub async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: &str,
    ) -> ClientResult<String> {
        validate_name(name)?;
        validate_email(email)?;
        validate_new_password(password)?;
        validate_role(role)?;

        let envelope: Envelope<AuthPayload> = self
            .api
            .post(
                "/auth/sign-up",
                &SignUpRequest {
                    name,
                    email,
                    password,
                    role,
                },
            )
            .await?;
        self.store_session(envelope, "/auth/sign-up").await
    }

    async fn request_password_reset(&self, email: &str) -> ClientResult<String> {
        validate_email(email)?;

        let envelope: Envelope<Value> = self
            .api
            .post("/auth/forgot-password", &ForgotPasswordRequest { email })
            .await?;

        if !envelope.is_success() {
            let message = envelope.message.unwrap_or_default();
            warn!(message = %message, "Password reset rejected");
            return Err(ClientError::Rejected { message });
        }

        info!("Password reset requested");
        Ok(envelope.message.unwrap_or_default())
    }

    async fn store_session(
        &self,
        envelope: Envelope<AuthPayload>,
        endpoint: &str,
    ) -> ClientResult<String> {
        let (message, payload) = envelope.into_success(endpoint).map_err(|e| {
            warn!(endpoint, error = %e, "Authentication rejected");
            e
        })?;

        let session = Session::new(payload.user, payload.access_token);
        self.session.save(&session).await?;

        info!(user_id = session.user.id, roles = ?session.roles, "Signed in");
        Ok(message)
    }

    // =========================================================================
    // Session Reads
    // =========================================================================

    pub async fn current_session(&self) -> ClientResult<Option<Session>> {
        Ok(self.session.load().await?)
    }

    pub async fn user(&self) -> ClientResult<Option<UserRecord>> {
        Ok(self.session.user().await?)
    }

    pub async fn is_signed_in(&self) -> ClientResult<bool> {
        Ok(self.current_session().await?.is_some())
    }

    /// Whether the stored session carries `slug`. Signed out means false.
    pub async fn has_role(&self, slug: &str) -> ClientResult<bool> {
        Ok(self
            .current_session()
            .await?
            .is_some_and(|s| s.has_role(slug)))
    }

    /// Where the signed-in user should land, per `routing`.
    pub async fn landing_destination(&self, routing: &RoutingTable) -> ClientResult<Option<String>> {
        Ok(self
            .current_session()
            .await?
            .and_then(|s| routing.resolve(&s.roles).map(str::to_string)))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
