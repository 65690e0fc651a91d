//! # App Error Type
//!
//! What the UI shell receives when a storefront call fails.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Storefront                         │
//! │                                                                         │
//! │  Shell screen                Rust storefront                            │
//! │  ────────────                ───────────────                            │
//! │                                                                         │
//! │  signIn(email, password)                                                │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  AppContext call  ──►  Result<T, AppError>                       │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  StoreError?  ─── StoreError::QueryFailed ─────────┐             │  │
//! │  │         │                                          │             │  │
//! │  │         ▼                                          ▼             │  │
//! │  │  ClientError? ─── Validation / Http / 429 ──── AppError ────────►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ───────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  { "code": "VALIDATION_ERROR", "message": "Invalid email format" }      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use dairy_client::ClientError;
use dairy_store::StoreError;
use serde::Serialize;

/// Error handed to the shell.
///
/// ## Serialization
/// ```json
/// {
///   "code": "RATE_LIMITED",
///   "message": "Rate limit exceeded after 6 attempts"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("[{code:?}] {message}")]
pub struct AppError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Form input failed a local rule; nothing was sent
    ValidationError,

    /// No stored session for a call that needs one
    NotSignedIn,

    /// The server answered with an error status or a non-success envelope
    ServerError,

    /// HTTP 429 that outlived the retry budget
    RateLimited,

    /// Connection failure or timeout
    NetworkError,

    /// Local storage failed
    StorageError,

    /// Checkout could not be submitted
    CheckoutFailed,

    /// Configuration could not be loaded or is invalid
    ConfigError,

    /// Anything else
    Internal,
}

/// Result type for storefront calls.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        AppError {
            code,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::Internal, message)
    }
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        let code = match &err {
            ClientError::Validation(_) => ErrorCode::ValidationError,
            ClientError::NotSignedIn => ErrorCode::NotSignedIn,
            ClientError::Rejected { .. }
            | ClientError::Http { .. }
            | ClientError::Decode { .. } => ErrorCode::ServerError,
            ClientError::RateLimited | ClientError::RateLimitExceeded { .. } => {
                ErrorCode::RateLimited
            }
            ClientError::Network(_) | ClientError::Timeout => ErrorCode::NetworkError,
            ClientError::Store(_) | ClientError::PartialSignOut { .. } => ErrorCode::StorageError,
            ClientError::Checkout { .. } => ErrorCode::CheckoutFailed,
            e if e.is_config_error() => ErrorCode::ConfigError,
            _ => ErrorCode::Internal,
        };

        if code == ErrorCode::Internal {
            tracing::error!(error = %err, "Unexpected storefront error");
        }

        AppError::new(code, err.user_message())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        // Log the actual error but return a generic message
        tracing::error!(error = %err, "Local storage failed");
        AppError::new(ErrorCode::StorageError, "Local storage operation failed")
    }
}
