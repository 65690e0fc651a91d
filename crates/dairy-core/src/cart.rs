//! # Cart
//!
//! In-memory shopping cart for the marketplace screen.
//!
//! ## Cart Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Screen Action            Operation                 Line Change         │
//! │  ─────────────            ─────────                 ───────────         │
//! │                                                                         │
//! │  Tap "Add" ──────────────► add_to_cart() ─────────► qty + 1 or insert  │
//! │                                                                         │
//! │  Tap "+" ────────────────► increase_quantity() ───► qty + 1            │
//! │                                                                         │
//! │  Tap "-" ────────────────► decrease_quantity() ───► qty - 1, 0 removes │
//! │                                                                         │
//! │  Type a quantity ────────► update_quantity() ─────► qty = n, ≤0 removes│
//! │                                                                         │
//! │  Tap bin ────────────────► remove_from_cart() ────► line removed       │
//! │                                                                         │
//! │  Invoice created ────────► clear_cart() ──────────► all lines removed  │
//! │                                                                         │
//! │  Operations on a product that is not in the cart are no-ops.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cart is never persisted; it lives as long as the app session.

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Product, ProductId};

// =============================================================================
// Cart Line
// =============================================================================

/// One product in the cart.
///
/// ## Price Freezing
/// The unit price is copied from the product when the line is created, so the
/// cart total does not change if the marketplace list is refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,

    /// Always at least 1.
    pub quantity: u32,

    pub image: Option<String>,
}

impl CartLine {
    fn from_product(product: &Product) -> Self {
        CartLine {
            product_id: product.id,
            name: product.name.clone(),
            unit_price: product.price,
            quantity: 1,
            image: product.image.clone(),
        }
    }

    /// Unit price × quantity.
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by `product_id`
/// - No line ever has quantity 0
/// - Lines keep insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one unit of `product`, inserting a new line if needed.
    pub fn add_to_cart(&mut self, product: &Product) {
        match self.line_mut(product.id) {
            Some(line) => line.quantity += 1,
            None => self.lines.push(CartLine::from_product(product)),
        }
        debug!(product_id = %product.id, "Added to cart");
    }

    /// Removes the line for `product_id`.
    pub fn remove_from_cart(&mut self, product_id: ProductId) {
        self.lines.retain(|l| l.product_id != product_id);
    }

    pub fn increase_quantity(&mut self, product_id: ProductId) {
        if let Some(line) = self.line_mut(product_id) {
            line.quantity += 1;
        }
    }

    /// Decrements the quantity, removing the line when it would reach zero.
    pub fn decrease_quantity(&mut self, product_id: ProductId) {
        match self.line(product_id).map(|l| l.quantity) {
            Some(1) => self.remove_from_cart(product_id),
            Some(_) => {
                if let Some(line) = self.line_mut(product_id) {
                    line.quantity -= 1;
                }
            }
            None => {}
        }
    }

    /// Sets an absolute quantity. Zero or negative removes the line.
    pub fn update_quantity(&mut self, product_id: ProductId, quantity: i64) {
        if quantity <= 0 {
            self.remove_from_cart(product_id);
            return;
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(line) = self.line_mut(product_id) {
            line.quantity = quantity;
        }
    }

    pub fn clear_cart(&mut self) {
        self.lines.clear();
    }

    /// Sum of quantity × unit price over all lines.
    pub fn total_price(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Number of distinct products.
    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    /// Number of units across all lines.
    pub fn total_quantity(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    fn line_mut(&mut self, product_id: ProductId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| l.product_id == product_id)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Owned copy of the lines, taken by checkout on begin and on submit.
    pub fn snapshot(&self) -> Vec<CartLine> {
        self.lines.clone()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn milk() -> Product {
        Product::new(ProductId(1), "Fresh Milk 1L", Money::from_shillings(60))
    }

    fn yoghurt() -> Product {
        Product::new(ProductId(2), "Yoghurt 500ml", Money::from_cents(8550))
    }

    #[test]
    fn test_add_same_product_increments() {
        let mut cart = Cart::new();
        cart.add_to_cart(&milk());
        cart.add_to_cart(&milk());

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.line(ProductId(1)).unwrap().quantity, 2);
        assert_eq!(cart.total_price(), Money::from_shillings(120));
    }

    #[test]
    fn test_total_over_multiple_lines() {
        let mut cart = Cart::new();
        cart.add_to_cart(&milk());
        cart.add_to_cart(&yoghurt());
        cart.increase_quantity(ProductId(2));

        // 60.00 + 2 × 85.50
        assert_eq!(cart.total_price(), Money::from_cents(23100));
        assert_eq!(cart.total_quantity(), 3);
    }

    #[test]
    fn test_decrease_removes_at_one() {
        let mut cart = Cart::new();
        cart.add_to_cart(&milk());
        cart.add_to_cart(&milk());

        cart.decrease_quantity(ProductId(1));
        assert_eq!(cart.line(ProductId(1)).unwrap().quantity, 1);

        cart.decrease_quantity(ProductId(1));
        assert!(cart.line(ProductId(1)).is_none());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity() {
        let mut cart = Cart::new();
        cart.add_to_cart(&milk());

        cart.update_quantity(ProductId(1), 5);
        assert_eq!(cart.line(ProductId(1)).unwrap().quantity, 5);

        cart.update_quantity(ProductId(1), 0);
        assert!(cart.is_empty());

        cart.add_to_cart(&milk());
        cart.update_quantity(ProductId(1), -3);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_absent_product_is_noop() {
        let mut cart = Cart::new();
        cart.add_to_cart(&milk());
        let before = cart.clone();

        cart.remove_from_cart(ProductId(99));
        cart.increase_quantity(ProductId(99));
        cart.decrease_quantity(ProductId(99));
        cart.update_quantity(ProductId(99), 4);

        assert_eq!(cart, before);
    }

    #[test]
    fn test_clear_and_snapshot() {
        let mut cart = Cart::new();
        cart.add_to_cart(&milk());
        cart.add_to_cart(&yoghurt());

        let snapshot = cart.snapshot();
        cart.clear_cart();

        assert!(cart.is_empty());
        assert_eq!(cart.total_price(), Money::zero());
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].product_id, ProductId(1));
    }

    #[test]
    fn test_line_price_is_frozen() {
        let mut cart = Cart::new();
        let mut product = milk();
        cart.add_to_cart(&product);

        product.price = Money::from_shillings(999);
        cart.add_to_cart(&product);

        assert_eq!(cart.total_price(), Money::from_shillings(120));
    }

    // =========================================================================
    // Operation Sequences
    // =========================================================================

    use proptest::prelude::*;
    use std::collections::HashSet;

    #[derive(Debug, Clone)]
    enum CartOp {
        Add(u64),
        Remove(u64),
        Increase(u64),
        Decrease(u64),
        Update(u64, i64),
        Clear,
    }

    /// Fixed shelf prices so the expected total can be recomputed.
    fn shelf_price(id: u64) -> Money {
        Money::from_cents(5000 + id as i64 * 1275)
    }

    fn shelf_product(id: u64) -> Product {
        Product::new(ProductId(id), format!("Product {id}"), shelf_price(id))
    }

    fn apply(cart: &mut Cart, op: &CartOp) {
        match *op {
            CartOp::Add(id) => cart.add_to_cart(&shelf_product(id)),
            CartOp::Remove(id) => cart.remove_from_cart(ProductId(id)),
            CartOp::Increase(id) => cart.increase_quantity(ProductId(id)),
            CartOp::Decrease(id) => cart.decrease_quantity(ProductId(id)),
            CartOp::Update(id, qty) => cart.update_quantity(ProductId(id), qty),
            CartOp::Clear => cart.clear_cart(),
        }
    }

    fn cart_op() -> impl Strategy<Value = CartOp> {
        let id = 1u64..=5;
        prop_oneof![
            4 => id.clone().prop_map(CartOp::Add),
            1 => id.clone().prop_map(CartOp::Remove),
            2 => id.clone().prop_map(CartOp::Increase),
            2 => id.clone().prop_map(CartOp::Decrease),
            2 => (id, -3i64..50).prop_map(|(id, qty)| CartOp::Update(id, qty)),
            1 => Just(CartOp::Clear),
        ]
    }

    fn cart_from(ops: &[CartOp]) -> Cart {
        let mut cart = Cart::new();
        for op in ops {
            apply(&mut cart, op);
        }
        cart
    }

    proptest! {
        #[test]
        fn prop_invariants_hold_after_every_operation(
            ops in prop::collection::vec(cart_op(), 0..60)
        ) {
            let mut cart = Cart::new();
            for op in &ops {
                apply(&mut cart, op);

                let mut seen = HashSet::new();
                for line in cart.lines() {
                    prop_assert!(line.quantity >= 1, "zero quantity after {:?}", op);
                    prop_assert!(seen.insert(line.product_id), "duplicate line after {:?}", op);
                    prop_assert_eq!(line.unit_price, shelf_price(line.product_id.0));
                }

                let expected: Money = cart
                    .lines()
                    .iter()
                    .map(|l| shelf_price(l.product_id.0) * l.quantity)
                    .sum();
                prop_assert_eq!(cart.total_price(), expected);
                prop_assert_eq!(cart.item_count(), seen.len());
            }
        }

        #[test]
        fn prop_add_then_remove_restores_total(
            ops in prop::collection::vec(cart_op(), 0..30),
            id in 1u64..=5
        ) {
            let mut cart = cart_from(&ops);
            cart.remove_from_cart(ProductId(id));
            let before = cart.clone();

            cart.add_to_cart(&shelf_product(id));
            prop_assert_eq!(cart.total_price(), before.total_price() + shelf_price(id));

            cart.remove_from_cart(ProductId(id));
            prop_assert_eq!(cart.total_price(), before.total_price());
            prop_assert_eq!(cart, before);
        }

        #[test]
        fn prop_add_then_decrease_is_identity(
            ops in prop::collection::vec(cart_op(), 0..30),
            id in 1u64..=5
        ) {
            let mut cart = cart_from(&ops);
            let before = cart.clone();

            cart.add_to_cart(&shelf_product(id));
            cart.decrease_quantity(ProductId(id));

            prop_assert_eq!(cart, before);
        }
    }
}
