//! # Checkout Workflow
//!
//! Drives the three-step checkout: delivery location, payment phone, then
//! order submission and confirmation.
//!
//! ## Submission Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  handle_payment_submit(phone)                                           │
//! │      │ invalid phone ──► warning notice, stay on step 2, no requests    │
//! │      ▼                                                                  │
//! │  submit_order                                                           │
//! │      │ no customer id ──► warning notice, stay on step 2, no requests   │
//! │      │                                                                  │
//! │      ├─► [GET /driver]                 only when assign_driver is set   │
//! │      │                                                                  │
//! │      ├─► POST /order/catalog  ×N lines   (concurrent, all-or-nothing)   │
//! │      │        │ any failure ──► "Error submitting orders!"              │
//! │      │        ▼                                                         │
//! │      ├─► POST /invoice/catalog {_orders: [pids]}                        │
//! │      │        │ failure ──► "Invoice creation failed"                   │
//! │      │        ▼                                                         │
//! │      ├─► POST /ipn/ke/mpesa/lnmo/transact                               │
//! │      │        ├── ok ─────► PaymentOutcome::Initiated                   │
//! │      │        └── fails ──► PaymentOutcome::Failed                      │
//! │      ▼                                                                  │
//! │  clear cart, step 3 (Confirmation)                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is retried and nothing is rolled back: orders created before an
//! invoice failure stay on the server.

use std::sync::{Arc, Mutex};

use dairy_core::cart::{Cart, CartLine};
use dairy_core::checkout::{CheckoutState, CheckoutStep, PaymentOutcome, PlacedOrder};
use dairy_core::money::{self, Money};
use dairy_core::types::DeliveryLocation;
use dairy_core::validation::validate_phone_number;
use dairy_core::{CoreError, Notice};
use dairy_store::{LocationStore, SessionStore};
use futures_util::future::try_join_all;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::api::{ApiClient, Created, DataEnvelope, Envelope};
use crate::config::CheckoutSettings;
use crate::error::{ClientError, ClientResult, SubmissionStage};
use crate::notify::NoticeSink;
use crate::orders::least_busy_driver;

// =============================================================================
// Cart Access
// =============================================================================

/// The cart checkout reads from and clears on success.
pub trait CartAccess: Send + Sync {
    fn snapshot(&self) -> Vec<CartLine>;
    fn clear(&self);
}

impl CartAccess for Mutex<Cart> {
    fn snapshot(&self) -> Vec<CartLine> {
        match self.lock() {
            Ok(cart) => cart.snapshot(),
            Err(poisoned) => poisoned.into_inner().snapshot(),
        }
    }

    fn clear(&self) {
        match self.lock() {
            Ok(mut cart) => cart.clear_cart(),
            Err(poisoned) => poisoned.into_inner().clear_cart(),
        }
    }
}

// =============================================================================
// Request Bodies
// =============================================================================

#[derive(Debug, Serialize)]
struct OrderRequest {
    order_category_id: u64,
    produce_category_id: u64,
    customer_id: u64,
    quantity: u32,
    #[serde(with = "money::api_number")]
    total_amount: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    driver_id: Option<u64>,
}

#[derive(Debug, Serialize)]
struct InvoiceRequest<'a> {
    category_id: u64,
    #[serde(with = "money::api_number")]
    payable: Money,
    #[serde(rename = "_orders")]
    orders: &'a [String],
}

#[derive(Debug, Serialize)]
struct PaymentRequest<'a> {
    reference: &'a str,
    amount: String,
    telephone: &'a str,
}

// =============================================================================
// Workflow
// =============================================================================

/// Dependencies of a checkout run.
#[derive(Clone)]
pub struct CheckoutDeps {
    pub api: Arc<ApiClient>,
    pub locations: Arc<LocationStore>,
    pub session: Arc<SessionStore>,
    pub cart: Arc<dyn CartAccess>,
    pub notices: Arc<dyn NoticeSink>,
    pub settings: CheckoutSettings,
}

/// One checkout session, from the location form to the confirmation screen.
pub struct CheckoutWorkflow {
    deps: CheckoutDeps,
    state: CheckoutState,
    id: Uuid,
}

impl CheckoutWorkflow {
    /// Starts on step 1 with a snapshot of the cart and the current stored
    /// location as form defaults.
    pub async fn begin(deps: CheckoutDeps) -> Self {
        let location = deps.locations.location().await;
        let state = CheckoutState::begin(deps.cart.snapshot(), location);
        let id = Uuid::new_v4();

        info!(
            checkout_id = %id,
            lines = state.cart().len(),
            total = %state.total(),
            "Checkout started"
        );
        Self { deps, state, id }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    pub fn step(&self) -> CheckoutStep {
        self.state.step()
    }

    /// Step 1: persists the location and moves to payment.
    pub async fn handle_location_submit(&mut self, location: DeliveryLocation) -> ClientResult<()> {
        self.expect_step(CheckoutStep::Location)?;

        if let Err(e) = self.deps.locations.save(location.clone()).await {
            error!(checkout_id = %self.id, error = %e, "Could not save delivery location");
            let e = ClientError::from(e);
            self.deps
                .notices
                .notify(e.to_notice("Could not save delivery location"));
            return Err(e);
        }

        self.state.location_saved(location)?;
        Ok(())
    }

    /// Step 2 back to step 1.
    pub fn back_to_location(&mut self) -> ClientResult<()> {
        self.state.back_to_location()?;
        Ok(())
    }

    /// Step 2: validates the phone number and submits the order.
    pub async fn handle_payment_submit(&mut self, phone: &str) -> ClientResult<PlacedOrder> {
        self.expect_step(CheckoutStep::Payment)?;

        if let Err(e) = validate_phone_number(phone) {
            debug!(checkout_id = %self.id, "Rejected payment phone number");
            self.deps.notices.notify(
                Notice::warning("Invalid Phone Number!")
                    .with_detail("Please enter a valid Kenyan phone number"),
            );
            return Err(e.into());
        }

        self.state.set_payment_phone(phone)?;
        self.submit_order(phone).await
    }

    /// Creates one order per line of the live cart, the invoice, then the
    /// payment request. Reaches step 3 once the invoice exists.
    pub async fn submit_order(&mut self, phone: &str) -> ClientResult<PlacedOrder> {
        self.expect_step(CheckoutStep::Payment)?;

        let customer_id = match self.deps.session.user().await? {
            Some(user) => user.customer_id(),
            None => None,
        };
        let Some(customer_id) = customer_id else {
            warn!(checkout_id = %self.id, "No customer profile on the session");
            self.deps.notices.notify(
                Notice::warning("Customer ID is not set")
                    .with_detail("Please provide a Customer number"),
            );
            return Err(CoreError::MissingCustomer.into());
        };

        self.state.refresh_cart(self.deps.cart.snapshot())?;
        if self.state.cart().is_empty() {
            let e = ClientError::from(CoreError::EmptyCart);
            self.deps
                .notices
                .notify(e.to_notice("Error submitting orders!"));
            return Err(e);
        }

        let driver_id = match self.assign_driver().await {
            Ok(driver_id) => driver_id,
            Err(e) => return Err(self.fail("Error submitting orders!", e)),
        };

        let order_ids = match self.create_orders(customer_id, driver_id).await {
            Ok(ids) => ids,
            Err(e) => return Err(self.fail("Error submitting orders!", e)),
        };

        let total = self.state.total();
        let invoice_id = match self.create_invoice(&order_ids, total).await {
            Ok(id) => id,
            Err(e) => return Err(self.fail("Invoice creation failed", e)),
        };

        let payment = self.request_payment(&invoice_id, total, phone).await;

        let placed = PlacedOrder {
            order_ids,
            invoice_id,
            total,
            payment,
        };

        self.deps.cart.clear();
        self.state.order_placed(placed.clone())?;

        info!(
            checkout_id = %self.id,
            invoice_id = %placed.invoice_id,
            orders = placed.order_ids.len(),
            payment_initiated = placed.payment.is_initiated(),
            "Checkout complete"
        );
        Ok(placed)
    }

    // =========================================================================
    // Submission Stages
    // =========================================================================

    async fn assign_driver(&self) -> ClientResult<Option<u64>> {
        if !self.deps.settings.assign_driver {
            return Ok(None);
        }
        let driver = least_busy_driver(&self.deps.api)
            .await
            .map_err(|e| e.at_stage(SubmissionStage::DriverLookup))?;
        if driver.is_none() {
            warn!(checkout_id = %self.id, "No driver available, ordering without one");
        }
        Ok(driver.map(|d| d.id))
    }

    async fn create_orders(
        &self,
        customer_id: u64,
        driver_id: Option<u64>,
    ) -> ClientResult<Vec<String>> {
        let api = self.deps.api.as_ref();
        let order_category_id = self.deps.settings.order_category_id;

        let requests = self.state.cart().iter().map(|line| {
            let body = OrderRequest {
                order_category_id,
                produce_category_id: line.product_id.0,
                customer_id,
                quantity: line.quantity,
                total_amount: line.line_total(),
                driver_id,
            };
            async move {
                let created: DataEnvelope<Created> = api.post("/order/catalog", &body).await?;
                Ok::<_, ClientError>(created.data.pid)
            }
        });

        let ids = try_join_all(requests)
            .await
            .map_err(|e| e.at_stage(SubmissionStage::Orders))?;
        debug!(checkout_id = %self.id, orders = ?ids, "Orders created");
        Ok(ids)
    }

    async fn create_invoice(&self, order_ids: &[String], payable: Money) -> ClientResult<String> {
        let body = InvoiceRequest {
            category_id: self.deps.settings.invoice_category_id,
            payable,
            orders: order_ids,
        };
        let created: DataEnvelope<Created> = self
            .deps
            .api
            .post("/invoice/catalog", &body)
            .await
            .map_err(|e| e.at_stage(SubmissionStage::Invoice))?;
        debug!(checkout_id = %self.id, invoice_id = %created.data.pid, "Invoice created");
        Ok(created.data.pid)
    }

    /// Never fails the checkout; the outcome is reported instead.
    async fn request_payment(&self, invoice_id: &str, amount: Money, phone: &str) -> PaymentOutcome {
        let body = PaymentRequest {
            reference: invoice_id,
            amount: amount.to_api_string(),
            telephone: phone,
        };

        match self
            .deps
            .api
            .post::<_, Envelope<Value>>("/ipn/ke/mpesa/lnmo/transact", &body)
            .await
        {
            Ok(envelope) => {
                info!(checkout_id = %self.id, "Payment request initiated");
                let notice = Notice::success("Transaction initialization!");
                self.deps.notices.notify(match &envelope.message {
                    Some(message) => notice.with_detail(message.clone()),
                    None => notice,
                });
                PaymentOutcome::Initiated {
                    message: envelope.message,
                }
            }
            Err(e) => {
                warn!(checkout_id = %self.id, error = %e, "Payment request failed");
                self.deps
                    .notices
                    .notify(e.to_notice("Transaction initialization!"));
                PaymentOutcome::Failed {
                    reason: e.user_message(),
                }
            }
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn expect_step(&self, step: CheckoutStep) -> ClientResult<()> {
        if self.state.step() != step {
            return Err(CoreError::InvalidTransition {
                from: self.state.step(),
                to: step,
            }
            .into());
        }
        Ok(())
    }

    fn fail(&self, title: &str, e: ClientError) -> ClientError {
        error!(checkout_id = %self.id, error = %e, "{}", title);
        self.deps.notices.notify(e.to_notice(title));
        e
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
