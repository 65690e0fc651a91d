//! # List Fetching
//!
//! One parameterized fetcher serves the product catalog, supplier inventory
//! and order lists.
//!
//! ## Query Encoding
//! ```text
//! ┌──────────────────────┬──────────────────────────────────────────────────┐
//! │ ListQuery field      │ request parameter                                │
//! ├──────────────────────┼──────────────────────────────────────────────────┤
//! │ status               │ filter[_status]=2                                │
//! │ date range (orders)  │ filter[date_range][start|end]=YYYY-MM-DD         │
//! │ date range (stock)   │ filter[_timestamp][start|end]   end pushed +1 day│
//! │ customer/driver/...  │ filter[customer_id]=44                           │
//! │ page                 │ page[number]=3                                   │
//! │ include              │ include=produce_category,customer                │
//! │ sort                 │ sort=order_count                                 │
//! └──────────────────────┴──────────────────────────────────────────────────┘
//! ```
//!
//! ## Fetcher State
//! ```text
//!   fetch() ───► page N replaces items
//!   refresh() ─► page N again, replaces items
//!   load_more() ─► page N+1 appended   (no-op when N == last_page)
//!
//!   every request: 429 ─► backoff 1s, 2s, 4s, 8s, 16s ─► RateLimitExceeded
//! ```

use std::sync::Arc;

use chrono::NaiveDate;
use dairy_core::types::{InventoryItem, Order, OrderStatus, PageMeta, Product};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, Page};
use crate::error::ClientResult;
use crate::retry::{retry_rate_limited, RetryPolicy};

const DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// Resources
// =============================================================================

/// The list endpoints the fetcher knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListResource {
    Products,
    Inventory,
    Orders,
}

impl ListResource {
    pub fn path(&self) -> &'static str {
        match self {
            ListResource::Products => "/produce/category",
            ListResource::Inventory => "/inventory/catalog",
            ListResource::Orders => "/order/catalog",
        }
    }

    /// Relations requested by default.
    pub fn default_include(&self) -> &'static [&'static str] {
        match self {
            ListResource::Products => &[],
            ListResource::Inventory => &["category", "supplier"],
            ListResource::Orders => &["order_category", "produce_category", "customer", "driver"],
        }
    }

    /// Whether the endpoint pages its results.
    pub fn is_paginated(&self) -> bool {
        !matches!(self, ListResource::Products)
    }
}

// =============================================================================
// Query
// =============================================================================

/// Filters for one list request. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub status: Option<u8>,

    /// Inclusive start and end dates.
    pub date_range: Option<(NaiveDate, NaiveDate)>,

    pub customer_id: Option<u64>,
    pub driver_id: Option<u64>,
    pub supplier_id: Option<u64>,

    /// Page to load on `fetch`. Paginated resources default to page 1.
    pub page: Option<u32>,

    pub include: Vec<String>,
    pub sort: Option<String>,
}

impl ListQuery {
    /// A query carrying `resource`'s default includes.
    pub fn for_resource(resource: ListResource) -> Self {
        Self {
            include: resource
                .default_include()
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ..Default::default()
        }
    }

    pub fn with_order_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status.code());
        self
    }

    pub fn with_status(mut self, status: u8) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.date_range = Some((start, end));
        self
    }

    /// The `days` days ending at `today`, the window list screens open with.
    pub fn with_last_days(self, today: NaiveDate, days: u64) -> Self {
        let start = today
            .checked_sub_days(chrono::Days::new(days))
            .unwrap_or(today);
        self.with_date_range(start, today)
    }

    pub fn with_customer(mut self, id: u64) -> Self {
        self.customer_id = Some(id);
        self
    }

    pub fn with_driver(mut self, id: u64) -> Self {
        self.driver_id = Some(id);
        self
    }

    pub fn with_supplier(mut self, id: u64) -> Self {
        self.supplier_id = Some(id);
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    /// Encodes the query for `resource`, requesting `page` if given.
    pub fn to_params(&self, resource: ListResource, page: Option<u32>) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = Vec::new();
        let mut push = |key: &str, value: String| params.push((key.to_string(), value));

        if let Some(status) = self.status {
            push("filter[_status]", status.to_string());
        }

        if let Some((start, end)) = self.date_range {
            match resource {
                ListResource::Orders => {
                    push("filter[date_range][start]", start.format(DATE_FORMAT).to_string());
                    push("filter[date_range][end]", end.format(DATE_FORMAT).to_string());
                }
                ListResource::Inventory => {
                    // The inventory filter treats `end` as exclusive.
                    let end = end.succ_opt().unwrap_or(end);
                    push("filter[_timestamp][start]", start.format(DATE_FORMAT).to_string());
                    push("filter[_timestamp][end]", end.format(DATE_FORMAT).to_string());
                }
                ListResource::Products => {}
            }
        }

        if let Some(id) = self.customer_id {
            push("filter[customer_id]", id.to_string());
        }
        if let Some(id) = self.driver_id {
            push("filter[driver_id]", id.to_string());
        }
        if let Some(id) = self.supplier_id {
            push("filter[supplier_id]", id.to_string());
        }

        if let Some(page) = page {
            push("page[number]", page.to_string());
        }
        if !self.include.is_empty() {
            push("include", self.include.join(","));
        }
        if let Some(sort) = &self.sort {
            push("sort", sort.clone());
        }

        params
    }
}

// =============================================================================
// Fetcher
// =============================================================================

/// Holds one list and the state a list screen renders.
pub struct ListFetcher<T> {
    api: Arc<ApiClient>,
    resource: ListResource,
    query: ListQuery,
    policy: RetryPolicy,
    items: Vec<T>,
    meta: Option<PageMeta>,
    loading: bool,
    last_error: Option<String>,
}

pub type ProductList = ListFetcher<Product>;
pub type InventoryList = ListFetcher<InventoryItem>;
pub type OrderList = ListFetcher<Order>;

impl<T: DeserializeOwned> ListFetcher<T> {
    pub fn new(
        api: Arc<ApiClient>,
        resource: ListResource,
        query: ListQuery,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            api,
            resource,
            query,
            policy,
            items: Vec::new(),
            meta: None,
            loading: false,
            last_error: None,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn meta(&self) -> Option<&PageMeta> {
        self.meta.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Message of the most recent failed request, cleared on success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    pub fn resource(&self) -> ListResource {
        self.resource
    }

    /// Replaces the filters. Takes effect on the next `fetch`.
    pub fn set_query(&mut self, query: ListQuery) {
        self.query = query;
    }

    /// Loads the query's page, replacing current items.
    pub async fn fetch(&mut self) -> ClientResult<&[T]> {
        let page = match self.query.page {
            Some(page) => Some(page),
            None if self.resource.is_paginated() => Some(1),
            None => None,
        };
        self.load(page, false).await?;
        Ok(&self.items)
    }

    /// Reloads the page currently shown, replacing current items.
    pub async fn refresh(&mut self) -> ClientResult<&[T]> {
        let page = match self.meta {
            Some(meta) => Some(meta.current_page),
            None => return self.fetch().await,
        };
        self.load(page, false).await?;
        Ok(&self.items)
    }

    /// Appends the next page. Returns `false` without a request when there
    /// is nothing more to load.
    pub async fn load_more(&mut self) -> ClientResult<bool> {
        let Some(meta) = self.meta.filter(PageMeta::has_next_page) else {
            debug!(resource = ?self.resource, "No further page to load");
            return Ok(false);
        };
        self.load(Some(meta.current_page + 1), true).await?;
        Ok(true)
    }

    async fn load(&mut self, page: Option<u32>, append: bool) -> ClientResult<()> {
        let params = self.query.to_params(self.resource, page);
        let path = self.resource.path();

        let result = {
            let _loading = LoadingFlag::raise(&mut self.loading);
            let api = self.api.as_ref();
            let params = params.as_slice();
            retry_rate_limited(&self.policy, move || api.get::<Page<T>>(path, params)).await
        };

        match result {
            Ok(fetched) => {
                info!(
                    resource = ?self.resource,
                    page = ?page,
                    count = fetched.data.len(),
                    "List loaded"
                );
                if append {
                    self.items.extend(fetched.data);
                } else {
                    self.items = fetched.data;
                }
                self.meta = fetched.meta;
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                warn!(resource = ?self.resource, error = %e, "List fetch failed");
                self.last_error = Some(e.user_message());
                Err(e)
            }
        }
    }
}

/// Holds `loading` up for one request. Lowered on drop, so a fetch whose
/// future is dropped mid-request does not leave the list stuck loading.
struct LoadingFlag<'a>(&'a mut bool);

impl<'a> LoadingFlag<'a> {
    fn raise(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for LoadingFlag<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

impl ListFetcher<Product> {
    /// The marketplace catalog.
    pub fn products(api: Arc<ApiClient>, policy: RetryPolicy) -> Self {
        Self::new(
            api,
            ListResource::Products,
            ListQuery::for_resource(ListResource::Products),
            policy,
        )
    }
}

impl ListFetcher<InventoryItem> {
    pub fn inventory(api: Arc<ApiClient>, query: ListQuery, policy: RetryPolicy) -> Self {
        Self::new(api, ListResource::Inventory, query, policy)
    }
}

impl ListFetcher<Order> {
    pub fn orders(api: Arc<ApiClient>, query: ListQuery, policy: RetryPolicy) -> Self {
        Self::new(api, ListResource::Orders, query, policy)
    }

    /// Loaded orders whose product name contains `needle`, ignoring case.
    pub fn search(&self, needle: &str) -> Vec<&Order> {
        let needle = needle.to_lowercase();
        self.items
            .iter()
            .filter(|order| {
                needle.is_empty()
                    || order
                        .produce_category
                        .as_ref()
                        .is_some_and(|p| p.name.to_lowercase().contains(&needle))
            })
            .collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::test_support::client_for;
    use serde_json::{json, Value};
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn order_json(id: u64, name: &str) -> Value {
        json!({
            "id": id,
            "_pid": format!("ORD-{id}"),
            "produce_category_id": 3,
            "customer_id": 44,
            "quantity": 2,
            "total_amount": "120.00",
            "_status": 1,
            "produce_category": {"id": 3, "name": name, "price": "60.00"}
        })
    }

    fn page_json(items: Vec<Value>, current: u32, last: u32) -> Value {
        json!({
            "data": items,
            "meta": {"current_page": current, "last_page": last, "per_page": 2, "total": 3}
        })
    }

    #[test]
    fn test_order_query_params() {
        let query = ListQuery::for_resource(ListResource::Orders)
            .with_order_status(OrderStatus::Completed)
            .with_date_range(date(2024, 3, 1), date(2024, 3, 31))
            .with_customer(44);

        let params = query.to_params(ListResource::Orders, Some(1));
        let as_str: Vec<(&str, &str)> = params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        assert_eq!(
            as_str,
            vec![
                ("filter[_status]", "3"),
                ("filter[date_range][start]", "2024-03-01"),
                ("filter[date_range][end]", "2024-03-31"),
                ("filter[customer_id]", "44"),
                ("page[number]", "1"),
                ("include", "order_category,produce_category,customer,driver"),
            ]
        );
    }

    #[test]
    fn test_inventory_end_date_is_pushed_forward() {
        let query = ListQuery::for_resource(ListResource::Inventory)
            .with_date_range(date(2024, 2, 1), date(2024, 2, 29))
            .with_supplier(12);

        let params = query.to_params(ListResource::Inventory, None);
        assert!(params.contains(&("filter[_timestamp][start]".into(), "2024-02-01".into())));
        assert!(params.contains(&("filter[_timestamp][end]".into(), "2024-03-01".into())));
        assert!(params.contains(&("filter[supplier_id]".into(), "12".into())));
        assert!(params.contains(&("include".into(), "category,supplier".into())));
        assert!(!params.iter().any(|(k, _)| k == "page[number]"));
    }

    #[test]
    fn test_last_days_window() {
        let query = ListQuery::default().with_last_days(date(2024, 3, 31), 30);
        assert_eq!(query.date_range, Some((date(2024, 3, 1), date(2024, 3, 31))));
    }

    #[test]
    fn test_empty_query_sends_nothing() {
        assert!(ListQuery::default()
            .to_params(ListResource::Products, None)
            .is_empty());
    }

    #[tokio::test]
    async fn test_products_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/produce/category"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"id": 1, "name": "Fresh Milk", "price": "60.00"},
                    {"id": 2, "name": "Mala", "price": 85}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _) = client_for(&server);
        let mut products = ListFetcher::products(Arc::new(client), RetryPolicy::immediate(5));

        let items = products.fetch().await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].name, "Mala");
        assert!(products.meta().is_none());
        assert!(!products.is_loading());

        // Unpaginated: nothing more to load.
        assert!(!products.load_more().await.unwrap());
    }

    #[tokio::test]
    async fn test_cancelled_fetch_clears_loading() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/produce/category"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": []}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let (client, _) = client_for(&server);
        let mut products = ListFetcher::products(Arc::new(client), RetryPolicy::immediate(5));

        let timed_out = tokio::time::timeout(Duration::from_millis(50), products.fetch()).await;
        assert!(timed_out.is_err());
        assert!(!products.is_loading());
        assert!(products.items().is_empty());
        assert!(products.last_error().is_none());
    }

    #[tokio::test]
    async fn test_load_more_appends_and_stops_at_last_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/order/catalog"))
            .and(query_param("page[number]", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(
                vec![order_json(1, "Fresh Milk"), order_json(2, "Yoghurt")],
                1,
                2,
            )))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/order/catalog"))
            .and(query_param("page[number]", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(
                vec![order_json(3, "Ghee")],
                2,
                2,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _) = client_for(&server);
        let query = ListQuery::for_resource(ListResource::Orders).with_customer(44);
        let mut orders = ListFetcher::orders(Arc::new(client), query, RetryPolicy::immediate(5));

        assert_eq!(orders.fetch().await.unwrap().len(), 2);
        assert!(orders.load_more().await.unwrap());
        assert_eq!(orders.items().len(), 3);
        assert_eq!(orders.meta().map(|m| m.current_page), Some(2));

        // Last page reached; no third request.
        assert!(!orders.load_more().await.unwrap());
        assert_eq!(orders.items().len(), 3);

        let found: Vec<u64> = orders.search("GHEE").iter().map(|o| o.id).collect();
        assert_eq!(found, vec![3]);
    }

    #[tokio::test]
    async fn test_refresh_reloads_current_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/inventory/catalog"))
            .and(query_param("page[number]", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [],
                "meta": {"current_page": 1, "last_page": 1, "per_page": 15, "total": 0}
            })))
            .expect(2)
            .mount(&server)
            .await;

        let (client, _) = client_for(&server);
        let mut stock = ListFetcher::<InventoryItem>::inventory(
            Arc::new(client),
            ListQuery::for_resource(ListResource::Inventory),
            RetryPolicy::immediate(5),
        );

        stock.fetch().await.unwrap();
        stock.refresh().await.unwrap();
        assert!(stock.items().is_empty());
    }

    #[tokio::test]
    async fn test_rate_limited_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/order/catalog"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(3)
            .expect(3)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/order/catalog"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(page_json(vec![order_json(1, "Fresh Milk")], 1, 1)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (client, _) = client_for(&server);
        let mut orders = ListFetcher::orders(
            Arc::new(client),
            ListQuery::for_resource(ListResource::Orders),
            RetryPolicy::immediate(5),
        );

        assert_eq!(orders.fetch().await.unwrap().len(), 1);
        assert!(orders.last_error().is_none());
    }

    #[tokio::test]
    async fn test_rate_limit_exceeded_after_six_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/order/catalog"))
            .respond_with(ResponseTemplate::new(429))
            .expect(6)
            .mount(&server)
            .await;

        let (client, _) = client_for(&server);
        let mut orders = ListFetcher::orders(
            Arc::new(client),
            ListQuery::for_resource(ListResource::Orders),
            RetryPolicy::immediate(5),
        );

        let err = orders.fetch().await.unwrap_err();
        assert!(matches!(err, ClientError::RateLimitExceeded { attempts: 6 }));
        assert!(orders.last_error().is_some());
        assert!(!orders.is_loading());
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/produce/category"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _) = client_for(&server);
        let mut products = ListFetcher::products(Arc::new(client), RetryPolicy::immediate(5));

        let err = products.fetch().await.unwrap_err();
        assert!(matches!(err, ClientError::Http { status: 500, .. }));
    }
}
