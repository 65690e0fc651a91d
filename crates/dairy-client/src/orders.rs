//! # Order Actions
//!
//! Single-order reads and updates used by the order detail screen, plus the
//! driver lookup checkout uses when driver assignment is enabled.

use std::sync::Arc;

use dairy_core::types::{Order, OrderStatus};
use dairy_core::Notice;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::api::{ApiClient, DataEnvelope, Page};
use crate::error::ClientResult;
use crate::notify::NoticeSink;

const DETAIL_INCLUDE: &str = "order_category,produce_category,customer,driver";

/// A driver as listed by `/driver`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DriverSummary {
    pub id: u64,

    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Serialize)]
struct StatusUpdate {
    #[serde(rename = "_status")]
    status: OrderStatus,
}

pub struct OrderService {
    api: Arc<ApiClient>,
    notices: Arc<dyn NoticeSink>,
}

impl OrderService {
    pub fn new(api: Arc<ApiClient>, notices: Arc<dyn NoticeSink>) -> Self {
        Self { api, notices }
    }

    /// Loads one order with its category, product, customer and driver.
    pub async fn detail(&self, id: u64) -> ClientResult<Order> {
        let path = format!("/order/catalog/{id}");
        let query = [("include".to_string(), DETAIL_INCLUDE.to_string())];

        match self.api.get::<DataEnvelope<Order>>(&path, &query).await {
            Ok(envelope) => Ok(envelope.data),
            Err(e) => {
                warn!(order_id = id, error = %e, "Order detail failed");
                self.notices
                    .notify(e.to_notice("Failed to fetch order details"));
                Err(e)
            }
        }
    }

    /// Sets the order's status to completed on the server, then locally.
    ///
    /// An order that is already completed is left alone.
    pub async fn mark_delivered(&self, order: &mut Order) -> ClientResult<()> {
        if order.status == OrderStatus::Completed {
            return Ok(());
        }

        let path = format!("/order/catalog/{}", order.id);
        let body = StatusUpdate {
            status: OrderStatus::Completed,
        };

        match self.api.patch::<_, Value>(&path, &body).await {
            Ok(_) => {
                order.status = OrderStatus::Completed;
                info!(order_id = order.id, "Order marked as delivered");
                self.notices
                    .notify(Notice::success("Order has been marked as delivered!"));
                Ok(())
            }
            Err(e) => {
                warn!(order_id = order.id, error = %e, "Order status update failed");
                self.notices
                    .notify(e.to_notice("Failed to update order status"));
                Err(e)
            }
        }
    }

    /// The driver with the fewest orders, if any driver exists.
    pub async fn least_busy_driver(&self) -> ClientResult<Option<DriverSummary>> {
        least_busy_driver(&self.api).await
    }
}

pub(crate) async fn least_busy_driver(api: &ApiClient) -> ClientResult<Option<DriverSummary>> {
    let query = [
        ("include".to_string(), "orders".to_string()),
        ("sort".to_string(), "order_count".to_string()),
    ];
    let page: Page<DriverSummary> = api.get("/driver", &query).await?;
    Ok(page.data.into_iter().next())
}

// =============================================================================
// Unit Tests
// =============================================================================
