//! # Domain Types
//!
//! Core domain types shared by the stores, the REST client and the screens.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Order       │   │  InventoryItem  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (numeric)   │   │  id / _pid      │   │  id / _pid      │       │
//! │  │  name, slug     │   │  customer_id    │   │  supplier_id    │       │
//! │  │  price (KES)    │   │  total_amount   │   │  quantity       │       │
//! │  └─────────────────┘   │  _status        │   │  price          │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   UserRecord    │   │    Session      │   │DeliveryLocation │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  roles[].slug   │──►│  user           │   │  city, road     │       │
//! │  │  customer.id    │   │  access_token   │   │  street         │       │
//! │  │  supplier.id    │   │  roles (slugs)  │   │  building       │       │
//! │  │  driver.id      │   └─────────────────┘   │  houseNumber    │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Server entities carry two identifiers:
//! - `id`: numeric primary key, used in filters and foreign keys
//! - `_pid`: public id string, used to link orders into an invoice and as the
//!   payment reference

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::CoreError;
use crate::money::{self, Money};

// =============================================================================
// Product
// =============================================================================

/// Numeric identifier of a produce category (the thing a customer buys).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductId(pub u64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A product listed in the marketplace (`GET /produce/category`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    pub id: ProductId,

    /// Display name shown on the marketplace card and in the cart.
    pub name: String,

    #[serde(default)]
    pub slug: String,

    /// Image URL, if the category has one.
    #[serde(default)]
    pub image: Option<String>,

    /// Unit price. The API sends it as a decimal string (`"120.00"`).
    #[serde(with = "money::decimal_string")]
    #[ts(as = "String")]
    pub price: Money,

    #[serde(default)]
    pub description: Option<String>,
}

impl Product {
    /// Creates a product with the fields the cart needs.
    pub fn new(id: ProductId, name: impl Into<String>, price: Money) -> Self {
        let name = name.into();
        Self {
            id,
            slug: name.to_lowercase().replace(' ', "-"),
            name,
            image: None,
            price,
            description: None,
        }
    }
}

// =============================================================================
// Delivery Location
// =============================================================================

/// Free-text delivery address entered on checkout step 1.
///
/// Stored under the `locationDetails` key with camelCase field names so that
/// values written by the mobile shell remain readable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct DeliveryLocation {
    pub city: String,
    pub road: String,
    pub street: String,
    pub building: String,
    pub house_number: String,
}

/// The editable fields of a [`DeliveryLocation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationField {
    City,
    Road,
    Street,
    Building,
    HouseNumber,
}

impl DeliveryLocation {
    /// True when every field is blank.
    pub fn is_empty(&self) -> bool {
        [
            &self.city,
            &self.road,
            &self.street,
            &self.building,
            &self.house_number,
        ]
        .iter()
        .all(|f| f.trim().is_empty())
    }

    /// Replaces a single field.
    pub fn set_field(&mut self, field: LocationField, value: impl Into<String>) {
        let slot = match field {
            LocationField::City => &mut self.city,
            LocationField::Road => &mut self.road,
            LocationField::Street => &mut self.street,
            LocationField::Building => &mut self.building,
            LocationField::HouseNumber => &mut self.house_number,
        };
        *slot = value.into();
    }
}

// =============================================================================
// Users & Sessions
// =============================================================================

/// A role attached to a user account. Only `slug` is relied upon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoleRecord {
    pub slug: String,

    #[serde(default)]
    pub name: Option<String>,
}

/// The id of a role-specific profile (customer, supplier or driver).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProfileRef {
    pub id: u64,
}

/// The signed-in user as returned by `/auth/sign-in` and `/auth/sign-up`.
///
/// Unknown fields in the server payload are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserRecord {
    pub id: u64,
    pub name: String,
    pub email: String,

    #[serde(default)]
    pub roles: Vec<RoleRecord>,

    #[serde(default)]
    pub customer: Option<ProfileRef>,

    #[serde(default)]
    pub supplier: Option<ProfileRef>,

    #[serde(default)]
    pub driver: Option<ProfileRef>,
}

impl UserRecord {
    /// Customer profile id, required to place orders.
    pub fn customer_id(&self) -> Option<u64> {
        self.customer.map(|c| c.id)
    }

    pub fn supplier_id(&self) -> Option<u64> {
        self.supplier.map(|s| s.id)
    }

    pub fn driver_id(&self) -> Option<u64> {
        self.driver.map(|d| d.id)
    }

    /// Role slugs in server order.
    pub fn role_slugs(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.slug.clone()).collect()
    }
}

/// An authenticated session: the user, the bearer token and the role slugs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Session {
    pub user: UserRecord,
    pub access_token: String,
    pub roles: Vec<String>,
}

impl Session {
    /// Builds a session, taking role slugs from the user record.
    pub fn new(user: UserRecord, access_token: impl Into<String>) -> Self {
        let roles = user.role_slugs();
        Self {
            user,
            access_token: access_token.into(),
            roles,
        }
    }

    pub fn has_role(&self, slug: &str) -> bool {
        self.roles.iter().any(|r| r == slug)
    }
}

// =============================================================================
// Orders & Inventory
// =============================================================================

/// Lifecycle state of an order, carried as `_status` (0-4) on the wire.
///
/// ```text
/// Pending(0) ──► Processing(1) ──► Processed(2) ──► Completed(3)
///      │
///      └──────────────────────────────────────────► Cancelled(4)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum OrderStatus {
    Pending,
    Processing,
    Processed,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const fn code(self) -> u8 {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::Processing => 1,
            OrderStatus::Processed => 2,
            OrderStatus::Completed => 3,
            OrderStatus::Cancelled => 4,
        }
    }

    /// Human label used on order cards.
    pub const fn label(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Processed => "PROCESSED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl TryFrom<u8> for OrderStatus {
    type Error = CoreError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(OrderStatus::Pending),
            1 => Ok(OrderStatus::Processing),
            2 => Ok(OrderStatus::Processed),
            3 => Ok(OrderStatus::Completed),
            4 => Ok(OrderStatus::Cancelled),
            other => Err(CoreError::Malformed {
                what: "order status".to_string(),
                reason: format!("unknown code {}", other),
            }),
        }
    }
}

impl From<OrderStatus> for u8 {
    fn from(status: OrderStatus) -> u8 {
        status.code()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An order as listed by `/order/catalog`.
///
/// `produce_category` is only present when requested via `include`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: u64,

    #[serde(rename = "_pid")]
    pub pid: String,

    #[serde(default)]
    pub order_category_id: Option<u64>,

    pub produce_category_id: u64,
    pub customer_id: u64,

    #[serde(default)]
    pub driver_id: Option<u64>,

    pub quantity: u32,

    #[serde(with = "money::decimal_string")]
    #[ts(as = "String")]
    pub total_amount: Money,

    #[serde(rename = "_timestamp", default)]
    pub timestamp: Option<String>,

    #[serde(rename = "_status")]
    #[ts(type = "number")]
    pub status: OrderStatus,

    #[serde(default)]
    pub produce_category: Option<Product>,
}

/// A supplier's stock entry as listed by `/inventory/catalog`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryItem {
    pub id: u64,

    #[serde(rename = "_pid")]
    pub pid: String,

    pub category_id: u64,
    pub supplier_id: u64,
    pub name: String,
    pub quantity: u32,

    #[serde(with = "money::decimal_string")]
    #[ts(as = "String")]
    pub price: Money,

    #[serde(rename = "_timestamp", default)]
    pub timestamp: Option<String>,

    #[serde(rename = "_status", default)]
    pub status: Option<u8>,

    #[serde(default)]
    pub category: Option<Product>,
}

// =============================================================================
// Pagination
// =============================================================================

/// Pagination block of a `{data, meta}` list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PageMeta {
    pub current_page: u32,
    pub last_page: u32,
    pub per_page: u32,
    pub total: u64,

    #[serde(default)]
    pub from: Option<u64>,

    #[serde(default)]
    pub to: Option<u64>,
}

impl PageMeta {
    pub fn has_next_page(&self) -> bool {
        self.current_page < self.last_page
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
