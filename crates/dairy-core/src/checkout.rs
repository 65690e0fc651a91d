//! # Checkout State Machine
//!
//! The three checkout steps and the only moves allowed between them.
//!
//! ## State Diagram
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Checkout Steps                                       │
//! │                                                                         │
//! │   ┌──────────────┐  location saved  ┌──────────────┐                   │
//! │   │ 1. Location  │ ───────────────► │  2. Payment  │                   │
//! │   │              │ ◄─────────────── │              │                   │
//! │   └──────────────┘       back       └──────┬───────┘                   │
//! │                                            │ invoice created           │
//! │                                            ▼                            │
//! │                                     ┌──────────────┐                   │
//! │                                     │3. Confirmation│  (terminal)      │
//! │                                     └──────────────┘                   │
//! │                                                                         │
//! │  Rejected: 1 → 3, 3 → anything, any move from the wrong step.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed payment request still lands on step 3: the orders and the invoice
//! exist at that point, and the outcome is recorded as
//! [`PaymentOutcome::Failed`].
//!
//! This module only tracks state. The network side lives in the
//! `dairy-client` checkout workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;
use ts_rs::TS;

use crate::cart::CartLine;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::DeliveryLocation;

// =============================================================================
// Steps
// =============================================================================

/// A checkout step, numbered 1 to 3 as shown in the progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum CheckoutStep {
    Location,
    Payment,
    Confirmation,
}

impl CheckoutStep {
    /// 1-based step number.
    pub const fn number(self) -> u8 {
        match self {
            CheckoutStep::Location => 1,
            CheckoutStep::Payment => 2,
            CheckoutStep::Confirmation => 3,
        }
    }

    /// Whether moving from `self` to `to` is permitted.
    pub const fn can_transition_to(self, to: CheckoutStep) -> bool {
        matches!(
            (self, to),
            (CheckoutStep::Location, CheckoutStep::Payment)
                | (CheckoutStep::Payment, CheckoutStep::Location)
                | (CheckoutStep::Payment, CheckoutStep::Confirmation)
        )
    }
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CheckoutStep::Location => "location",
            CheckoutStep::Payment => "payment",
            CheckoutStep::Confirmation => "confirmation",
        })
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// Result of the mobile-money payment request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "camelCase")]
#[ts(export)]
pub enum PaymentOutcome {
    /// The request was accepted; the customer confirms on the handset.
    Initiated { message: Option<String> },
    /// The request failed. Orders and invoice still exist.
    Failed { reason: String },
}

impl PaymentOutcome {
    pub fn is_initiated(&self) -> bool {
        matches!(self, PaymentOutcome::Initiated { .. })
    }
}

/// What was created on the server by a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PlacedOrder {
    /// Public ids of the created orders, in cart order.
    pub order_ids: Vec<String>,
    pub invoice_id: String,
    pub total: Money,
    pub payment: PaymentOutcome,
}

// =============================================================================
// State
// =============================================================================

/// Ephemeral state of one checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckoutState {
    step: CheckoutStep,

    /// Cart lines as of the last capture: when checkout began, then again
    /// just before the order is submitted.
    cart: Vec<CartLine>,

    location: DeliveryLocation,
    payment_phone: Option<String>,
    placed: Option<PlacedOrder>,

    #[ts(as = "String")]
    started_at: DateTime<Utc>,
}

impl CheckoutState {
    /// Starts a checkout on step 1 with a snapshot of the cart and the
    /// currently stored location as form defaults.
    pub fn begin(cart: Vec<CartLine>, location: DeliveryLocation) -> Self {
        Self {
            step: CheckoutStep::Location,
            cart,
            location,
            payment_phone: None,
            placed: None,
            started_at: Utc::now(),
        }
    }

    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    pub fn cart(&self) -> &[CartLine] {
        &self.cart
    }

    pub fn location(&self) -> &DeliveryLocation {
        &self.location
    }

    pub fn payment_phone(&self) -> Option<&str> {
        self.payment_phone.as_deref()
    }

    pub fn placed(&self) -> Option<&PlacedOrder> {
        self.placed.as_ref()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Replaces the captured lines with the live cart.
    ///
    /// The cart stays editable while checkout is open, so the submission
    /// recaptures it; what is ordered is then exactly what gets cleared.
    /// Rejected once the order is placed.
    pub fn refresh_cart(&mut self, lines: Vec<CartLine>) -> CoreResult<()> {
        if self.step == CheckoutStep::Confirmation {
            return Err(CoreError::InvalidTransition {
                from: self.step,
                to: self.step,
            });
        }
        self.cart = lines;
        Ok(())
    }

    /// Total of the captured cart lines.
    pub fn total(&self) -> Money {
        self.cart.iter().map(CartLine::line_total).sum()
    }

    fn transition(&mut self, to: CheckoutStep) -> CoreResult<()> {
        if !self.step.can_transition_to(to) {
            return Err(CoreError::InvalidTransition {
                from: self.step,
                to,
            });
        }
        info!(from = %self.step, to = %to, "Checkout step changed");
        self.step = to;
        Ok(())
    }

    /// Step 1 → 2 once the location has been persisted.
    pub fn location_saved(&mut self, location: DeliveryLocation) -> CoreResult<()> {
        self.transition(CheckoutStep::Payment)?;
        self.location = location;
        Ok(())
    }

    /// Step 2 → 1.
    pub fn back_to_location(&mut self) -> CoreResult<()> {
        self.transition(CheckoutStep::Location)
    }

    /// Records the phone number the payment request will be sent to.
    ///
    /// Only meaningful on step 2.
    pub fn set_payment_phone(&mut self, phone: impl Into<String>) -> CoreResult<()> {
        if self.step != CheckoutStep::Payment {
            return Err(CoreError::InvalidTransition {
                from: self.step,
                to: CheckoutStep::Payment,
            });
        }
        self.payment_phone = Some(phone.into());
        Ok(())
    }

    /// Step 2 → 3 after the invoice exists.
    pub fn order_placed(&mut self, placed: PlacedOrder) -> CoreResult<()> {
        self.transition(CheckoutStep::Confirmation)?;
        self.placed = Some(placed);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::Cart;
    use crate::types::{Product, ProductId};

    fn state_with_cart() -> CheckoutState {
        let mut cart = Cart::new();
        cart.add_to_cart(&Product::new(ProductId(1), "Milk", Money::from_shillings(60)));
        cart.add_to_cart(&Product::new(ProductId(2), "Ghee", Money::from_shillings(120)));
        CheckoutState::begin(cart.snapshot(), DeliveryLocation::default())
    }

    fn placed() -> PlacedOrder {
        PlacedOrder {
            order_ids: vec!["ORD-1".into(), "ORD-2".into()],
            invoice_id: "INV-1".into(),
            total: Money::from_shillings(180),
            payment: PaymentOutcome::Initiated { message: None },
        }
    }

    #[test]
    fn test_transition_table() {
        use CheckoutStep::*;
        assert!(Location.can_transition_to(Payment));
        assert!(Payment.can_transition_to(Location));
        assert!(Payment.can_transition_to(Confirmation));

        assert!(!Location.can_transition_to(Confirmation));
        assert!(!Confirmation.can_transition_to(Location));
        assert!(!Confirmation.can_transition_to(Payment));
        assert!(!Location.can_transition_to(Location));
    }

    #[test]
    fn test_happy_path() {
        let mut state = state_with_cart();
        assert_eq!(state.step(), CheckoutStep::Location);
        assert_eq!(state.total(), Money::from_shillings(180));

        let location = DeliveryLocation {
            city: "Nairobi".into(),
            ..Default::default()
        };
        state.location_saved(location.clone()).unwrap();
        assert_eq!(state.step(), CheckoutStep::Payment);
        assert_eq!(state.location(), &location);

        state.set_payment_phone("0712345678").unwrap();
        state.order_placed(placed()).unwrap();
        assert_eq!(state.step(), CheckoutStep::Confirmation);
        assert_eq!(state.placed().unwrap().invoice_id, "INV-1");
    }

    #[test]
    fn test_cannot_skip_payment() {
        let mut state = state_with_cart();
        let err = state.order_placed(placed()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidTransition {
                from: CheckoutStep::Location,
                to: CheckoutStep::Confirmation
            }
        ));
        assert_eq!(state.step(), CheckoutStep::Location);
        assert!(state.placed().is_none());
    }

    #[test]
    fn test_back_from_payment() {
        let mut state = state_with_cart();
        state.location_saved(DeliveryLocation::default()).unwrap();
        state.back_to_location().unwrap();
        assert_eq!(state.step(), CheckoutStep::Location);
    }

    #[test]
    fn test_confirmation_is_terminal() {
        let mut state = state_with_cart();
        state.location_saved(DeliveryLocation::default()).unwrap();
        state.order_placed(placed()).unwrap();

        assert!(state.back_to_location().is_err());
        assert!(state.order_placed(placed()).is_err());
        assert!(state.location_saved(DeliveryLocation::default()).is_err());
        assert!(state.set_payment_phone("0712345678").is_err());
        assert_eq!(state.step(), CheckoutStep::Confirmation);
    }

    #[test]
    fn test_refresh_cart_replaces_snapshot() {
        let mut state = state_with_cart();
        state.location_saved(DeliveryLocation::default()).unwrap();

        let mut cart = Cart::new();
        let milk = Product::new(ProductId(1), "Milk", Money::from_shillings(60));
        cart.add_to_cart(&milk);
        cart.add_to_cart(&milk);
        state.refresh_cart(cart.snapshot()).unwrap();

        assert_eq!(state.cart().len(), 1);
        assert_eq!(state.cart()[0].quantity, 2);
        assert_eq!(state.total(), Money::from_shillings(120));
        assert_eq!(state.step(), CheckoutStep::Payment);
    }

    #[test]
    fn test_refresh_cart_rejected_after_placement() {
        let mut state = state_with_cart();
        state.location_saved(DeliveryLocation::default()).unwrap();
        state.order_placed(placed()).unwrap();

        assert!(state.refresh_cart(Vec::new()).is_err());
        assert_eq!(state.total(), Money::from_shillings(180));
    }

    #[test]
    fn test_step_numbers() {
        assert_eq!(CheckoutStep::Location.number(), 1);
        assert_eq!(CheckoutStep::Payment.number(), 2);
        assert_eq!(CheckoutStep::Confirmation.number(), 3);
    }
}
