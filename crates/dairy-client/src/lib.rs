//! # dairy-client: REST Client and Workflows for the Dairy Marketplace
//!
//! Every network round trip the mobile shell makes goes through this crate:
//! authentication, product/inventory/order lists, order actions and the
//! checkout submission pipeline.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Client Architecture                              │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │  AuthService   │  │  ListFetcher   │  │  CheckoutWorkflow      │    │
//! │  │                │  │                │  │                        │    │
//! │  │ sign in / up   │  │ products       │  │ location ─► payment    │    │
//! │  │ sign out       │  │ inventory      │  │   ─► confirmation      │    │
//! │  │ roles, landing │  │ orders         │  │ orders, invoice, M-Pesa│    │
//! │  └───────┬────────┘  └───────┬────────┘  └───────────┬────────────┘    │
//! │          │                   │ 429 backoff           │                  │
//! │          │           ┌───────▼────────┐              │                  │
//! │          └──────────►│   ApiClient    │◄─────────────┘                  │
//! │                      │ reqwest + JSON │                                 │
//! │                      │ Bearer token   │                                 │
//! │                      └───────┬────────┘                                 │
//! │                              │                                          │
//! │  ┌───────────────────────────▼──────────────────────────────────────┐  │
//! │  │ dairy-store: SessionStore (token, user, roles), LocationStore    │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  User-facing outcomes are raised through a NoticeSink (toasts).        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`api`] - `ApiClient` and response envelopes
//! - [`auth`] - Sign-in, sign-up, sign-out, password reset
//! - [`checkout`] - Three-step checkout workflow
//! - [`config`] - Client configuration (TOML + environment)
//! - [`error`] - Client error types
//! - [`listing`] - Paged list fetching with filters
//! - [`notify`] - `NoticeSink` for toasts
//! - [`orders`] - Order detail, delivery updates, driver lookup
//! - [`retry`] - HTTP 429 backoff

// =============================================================================
// Module Declarations
// =============================================================================

pub mod api;
pub mod auth;
pub mod checkout;
pub mod config;
pub mod error;
pub mod listing;
pub mod notify;
pub mod orders;
pub mod retry;

#[cfg(test)]
mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use api::ApiClient;
pub use auth::AuthService;
pub use checkout::{CartAccess, CheckoutDeps, CheckoutWorkflow};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, SubmissionStage};
pub use listing::{
    InventoryList, ListFetcher, ListQuery, ListResource, OrderList, ProductList,
};
pub use notify::{CollectingNoticeSink, NoOpNoticeSink, NoticeSink};
pub use orders::{DriverSummary, OrderService};
pub use retry::RetryPolicy;
