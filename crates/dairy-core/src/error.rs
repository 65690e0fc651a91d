//! # Error Types
//!
//! Domain-specific error types for dairy-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  dairy-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  dairy-store errors (separate crate)                                   │
//! │  └── StoreError       - Key-value persistence failures                 │
//! │                                                                         │
//! │  dairy-client errors (separate crate)                                  │
//! │  └── ClientError      - HTTP, server and rate-limit failures           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ClientError → Notice → Screen     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field, step, id)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing notice

use thiserror::Error;

use crate::checkout::CheckoutStep;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A checkout transition was requested from the wrong step.
    ///
    /// ## When This Occurs
    /// - Submitting payment while still on the location form
    /// - Going back from the confirmation screen
    /// - Any attempt to skip a step
    #[error("Cannot move checkout from {from} to {to}")]
    InvalidTransition { from: CheckoutStep, to: CheckoutStep },

    /// Checkout was started with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// The signed-in user has no customer profile, so orders cannot be
    /// attributed to anyone.
    #[error("Customer ID is not set")]
    MissingCustomer,

    /// A stored or received value could not be interpreted.
    #[error("Malformed {what}: {reason}")]
    Malformed { what: String, reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// They are raised before any storage or network call happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g., malformed email, non-Kenyan phone number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// Returns the name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooShort { field, .. }
            | ValidationError::TooLong { field, .. }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
