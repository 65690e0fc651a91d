//! # dairy-core: Pure Business Logic for the Dairy Marketplace
//!
//! This crate is the **heart** of the marketplace client. It holds the cart
//! bookkeeping, the checkout step machine and every input rule as plain
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Dairy Marketplace Architecture                      │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Mobile Shell (screens)                       │   │
//! │  │   Marketplace ──► Cart ──► Checkout (3 steps) ──► Orders       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ AppContext (apps/storefront)           │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          dairy-client (REST)   │   dairy-store (key-value)      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ dairy-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌───────────┐ ┌───────┐ │   │
//! │  │   │  types  │ │  money  │ │   cart   │ │ checkout  │ │routing│ │   │
//! │  │   │ Product │ │  Money  │ │   Cart   │ │ Step 1→3  │ │ roles │ │   │
//! │  │   │ Session │ │  (KES)  │ │ CartLine │ │  machine  │ │ table │ │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └───────────┘ └───────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO STORAGE • NO NETWORK • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, UserRecord, Session, OrderStatus, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - In-memory cart store
//! - [`checkout`] - Three-step checkout state machine
//! - [`validation`] - Email, phone and form field rules
//! - [`routing`] - Role to landing-destination table
//! - [`notice`] - Transient user-facing notices (toasts)
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use dairy_core::cart::Cart;
//! use dairy_core::money::Money;
//! use dairy_core::types::{Product, ProductId};
//!
//! let milk = Product::new(ProductId(1), "Fresh Milk 1L", Money::from_shillings(60));
//!
//! let mut cart = Cart::new();
//! cart.add_to_cart(&milk);
//! cart.add_to_cart(&milk);
//!
//! assert_eq!(cart.total_price(), Money::from_shillings(120));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod checkout;
pub mod error;
pub mod money;
pub mod notice;
pub mod routing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine};
pub use checkout::{CheckoutState, CheckoutStep, PaymentOutcome, PlacedOrder};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use notice::{Notice, NoticeLevel};
pub use routing::{RoleRoute, RoutingTable};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Roles a user may pick when signing up.
///
/// The backend knows more roles (admins, staff), but only these three are
/// offered on the sign-up screen.
pub const SIGN_UP_ROLES: [&str; 3] = ["customer", "supplier", "driver"];

/// Minimum password length accepted before calling the sign-up endpoint.
pub const MIN_PASSWORD_LENGTH: usize = 6;
