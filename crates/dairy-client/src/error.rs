//! # Client Error Types
//!
//! Error types for REST calls and the workflows built on them.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Client Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │   Validation    │  │    Server       │  │     Transport           │ │
//! │  │ (no request     │  │                 │  │                         │ │
//! │  │  was sent)      │  │  Rejected       │  │  Network / Timeout      │ │
//! │  │  Validation     │  │  Http {status}  │  │  RateLimited (429)      │ │
//! │  │  Core           │  │  Decode         │  │  RateLimitExceeded      │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │ Configuration   │  │    Storage      │  │     Checkout            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Store          │  │  Checkout {stage}       │ │
//! │  │  InvalidUrl     │  │  PartialSign-   │  │  NotSignedIn            │ │
//! │  │  ConfigLoad...  │  │    Out {keys}   │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use dairy_core::{CoreError, Notice, ValidationError};
use dairy_store::StoreError;
use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// The part of order submission that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStage {
    DriverLookup,
    Orders,
    Invoice,
}

impl fmt::Display for SubmissionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SubmissionStage::DriverLookup => "driver lookup",
            SubmissionStage::Orders => "order creation",
            SubmissionStage::Invoice => "invoice creation",
        })
    }
}

/// Client error type covering every failure a service call can report.
#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Input Errors
    // =========================================================================
    /// Input rejected before any request was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A business rule was violated locally.
    #[error(transparent)]
    Core(CoreError),

    /// The operation needs a signed-in user.
    #[error("Not signed in")]
    NotSignedIn,

    // =========================================================================
    // Server Errors
    // =========================================================================
    /// The server answered but reported failure (`status != "success"`).
    #[error("{message}")]
    Rejected { message: String },

    /// Non-success HTTP status other than 429.
    #[error("Server returned {status}: {message}")]
    Http { status: u16, message: String },

    /// The response body did not have the expected shape.
    #[error("Unexpected response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// The request could not be completed.
    #[error("Network error: {0}")]
    Network(String),

    /// The request exceeded the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// A single HTTP 429 response.
    #[error("Too many requests")]
    RateLimited,

    /// Still rate limited after every retry.
    #[error("Too many requests, gave up after {attempts} attempts")]
    RateLimitExceeded { attempts: u32 },

    // =========================================================================
    // Storage Errors
    // =========================================================================
    #[error(transparent)]
    Store(StoreError),

    /// Sign-out left some session entries behind.
    #[error("Sign out incomplete, still stored: {}", keys.join(", "))]
    PartialSignOut { keys: Vec<String> },

    // =========================================================================
    // Checkout Errors
    // =========================================================================
    /// Order submission stopped at `stage`.
    #[error("Checkout failed during {stage}: {source}")]
    Checkout {
        stage: SubmissionStage,
        #[source]
        source: Box<ClientError>,
    },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<CoreError> for ClientError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(v) => ClientError::Validation(v),
            other => ClientError::Core(other),
        }
    }
}

impl From<StoreError> for ClientError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::PartialClear { keys } => ClientError::PartialSignOut { keys },
            other => ClientError::Store(other),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ClientError {
    /// Wraps `self` as a failure of the given submission stage.
    pub fn at_stage(self, stage: SubmissionStage) -> Self {
        ClientError::Checkout {
            stage,
            source: Box::new(self),
        }
    }

    /// Returns true only for a single 429, the one condition retried
    /// automatically.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::RateLimited)
    }

    /// Returns true if the input was rejected before any request was sent.
    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation(_))
    }

    /// Returns true for configuration problems.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidConfig(_)
                | ClientError::InvalidUrl(_)
                | ClientError::ConfigLoadFailed(_)
                | ClientError::ConfigSaveFailed(_)
        )
    }

    /// Text suitable for a notice detail line.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Rejected { message } => message.clone(),
            ClientError::Http { message, .. } if !message.is_empty() => message.clone(),
            ClientError::Http { status, .. } => format!("The server returned an error ({status})"),
            ClientError::Network(_) => "Check your internet connection and try again".to_string(),
            ClientError::Timeout => "The server took too long to respond".to_string(),
            ClientError::RateLimited | ClientError::RateLimitExceeded { .. } => {
                "The server is busy, please try again shortly".to_string()
            }
            ClientError::Checkout { source, .. } => source.user_message(),
            other => other.to_string(),
        }
    }

    /// Builds a notice with `title` and this error as detail.
    ///
    /// Validation problems are warnings; everything else is an error.
    pub fn to_notice(&self, title: impl Into<String>) -> Notice {
        let notice = if self.is_validation() {
            Notice::warning(title)
        } else {
            Notice::error(title)
        };
        notice.with_detail(self.user_message())
    }
}
