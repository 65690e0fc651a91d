//! # Cart State
//!
//! The one cart every screen shares.
//!
//! ## Thread Safety
//! The cart sits behind `Arc<Mutex<Cart>>`: marketplace cards, the cart
//! screen and checkout all touch it, and only one of them may change it at
//! a time. A poisoned lock is recovered rather than propagated, since a
//! `Cart` has no partially-applied state worth refusing.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart State Operations                                │
//! │                                                                         │
//! │  Screen Action            CartState                Cart Change          │
//! │  ─────────────            ─────────                ───────────          │
//! │                                                                         │
//! │  Tap "Add" ──────────────► add() ────────────────► line += 1 or push   │
//! │                                                                         │
//! │  Tap "+" / "-" ──────────► increase() / decrease() ► qty ± 1           │
//! │                                                                         │
//! │  Edit Quantity ──────────► set_quantity() ───────► qty = n (0 removes) │
//! │                                                                         │
//! │  Tap Remove ─────────────► remove() ─────────────► line removed        │
//! │                                                                         │
//! │  Checkout Start ─────────► shared().snapshot() ──► (read only)         │
//! │                                                                         │
//! │  Order Placed ───────────► shared().clear() ─────► lines cleared       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use dairy_client::CartAccess;
use dairy_core::money::Money;
use dairy_core::types::{Product, ProductId};
use dairy_core::{Cart, CartLine};
use serde::Serialize;

/// Cart summary for the cart badge and the cart screen footer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: u64,
    pub total_price: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            total_price: cart.total_price(),
        }
    }
}

/// Shared handle to the cart.
#[derive(Debug, Clone, Default)]
pub struct CartState {
    cart: Arc<Mutex<Cart>>,
}

impl CartState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Executes a function with read access to the cart.
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        f(&self.lock())
    }

    /// Executes a function with write access to the cart.
    pub fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        f(&mut self.lock())
    }

    pub fn add(&self, product: &Product) {
        self.with_cart_mut(|c| c.add_to_cart(product));
    }

    pub fn remove(&self, product_id: ProductId) {
        self.with_cart_mut(|c| c.remove_from_cart(product_id));
    }

    pub fn increase(&self, product_id: ProductId) {
        self.with_cart_mut(|c| c.increase_quantity(product_id));
    }

    pub fn decrease(&self, product_id: ProductId) {
        self.with_cart_mut(|c| c.decrease_quantity(product_id));
    }

    pub fn set_quantity(&self, product_id: ProductId, quantity: i64) {
        self.with_cart_mut(|c| c.update_quantity(product_id, quantity));
    }

    pub fn clear(&self) {
        self.with_cart_mut(Cart::clear_cart);
    }

    pub fn lines(&self) -> Vec<CartLine> {
        self.with_cart(Cart::snapshot)
    }

    pub fn totals(&self) -> CartTotals {
        self.with_cart(|c| CartTotals::from(c))
    }

    /// The same cart, as the checkout workflow sees it.
    pub fn shared(&self) -> Arc<dyn CartAccess> {
        self.cart.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Cart> {
        self.cart.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
