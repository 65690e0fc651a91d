//! # Role Routing
//!
//! Maps a signed-in user's roles to the destination the shell opens first.
//!
//! ```text
//! roles: ["supplier", "customer"]
//!
//! routes (table order wins):
//!   1. customer  → MarketplaceScreen      ◄── first route whose role the
//!   2. supplier  → InventoryListingScreen     user holds
//!   3. driver    → OrderListingScreen
//!
//! result: MarketplaceScreen
//! ```
//!
//! The table is empty unless the host configures it; destinations are opaque
//! strings interpreted by the shell.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A single `role → destination` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoleRoute {
    pub role: String,
    pub destination: String,
}

/// Ordered list of role routes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoutingTable {
    #[serde(default)]
    routes: Vec<RoleRoute>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The screens used by the marketplace mobile shell.
    pub fn marketplace_screens() -> Self {
        Self::new()
            .with_route("customer", "MarketplaceScreen")
            .with_route("supplier", "InventoryListingScreen")
            .with_route("driver", "OrderListingScreen")
    }

    /// Appends a route. Later routes have lower priority.
    pub fn with_route(mut self, role: impl Into<String>, destination: impl Into<String>) -> Self {
        self.routes.push(RoleRoute {
            role: role.into(),
            destination: destination.into(),
        });
        self
    }

    pub fn routes(&self) -> &[RoleRoute] {
        &self.routes
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Returns the destination of the first route whose role is held.
    pub fn resolve<S: AsRef<str>>(&self, roles: &[S]) -> Option<&str> {
        self.routes
            .iter()
            .find(|route| roles.iter().any(|r| r.as_ref() == route.role))
            .map(|route| route.destination.as_str())
    }
}
