//! # App Context
//!
//! Owns every store and service and hands them to screens.

use std::sync::Arc;

use dairy_client::{
    ApiClient, AuthService, CheckoutDeps, CheckoutWorkflow, ClientConfig, InventoryList, ListQuery,
    NoticeSink, OrderList, OrderService, ProductList, RetryPolicy,
};
use dairy_store::{Database, DbConfig, KeyValueStore, LocationStore, SessionStore};
use tracing::info;

use crate::error::AppResult;
use crate::state::CartState;

/// Everything the screens need, built once at startup.
pub struct AppContext {
    config: ClientConfig,
    db: Database,
    session: Arc<SessionStore>,
    locations: Arc<LocationStore>,
    api: Arc<ApiClient>,
    auth: AuthService,
    orders: OrderService,
    cart: CartState,
    notices: Arc<dyn NoticeSink>,
}

impl AppContext {
    /// Opens the database, restores the stored location and builds the
    /// services.
    ///
    /// ## Wiring
    /// ```text
    /// Database ──► SqliteKeyValueStore ──┬──► SessionStore ──► ApiClient ──┬──► AuthService
    ///                                    │                                 └──► OrderService
    ///                                    └──► LocationStore (loaded)
    /// CartState (empty) ─────────────────────────────────────────────────────► checkout
    /// ```
    pub async fn new(
        config: ClientConfig,
        db_config: DbConfig,
        notices: Arc<dyn NoticeSink>,
    ) -> AppResult<Self> {
        config.validate()?;

        let db = Database::new(db_config).await?;
        let kv: Arc<dyn KeyValueStore> = Arc::new(db.key_values());

        let session = Arc::new(SessionStore::new(kv.clone()));
        let locations = Arc::new(LocationStore::new(kv));
        let restored = locations.load().await;

        let api = Arc::new(ApiClient::new(&config.api, session.clone())?);
        let auth = AuthService::new(api.clone(), session.clone(), notices.clone());
        let orders = OrderService::new(api.clone(), notices.clone());

        info!(
            base_url = %api.base_url(),
            has_location = !restored.city.is_empty(),
            assign_driver = config.checkout.assign_driver,
            "Storefront initialized"
        );

        Ok(Self {
            config,
            db,
            session,
            locations,
            api,
            auth,
            orders,
            cart: CartState::new(),
            notices,
        })
    }

    /// Context over an in-memory database.
    pub async fn in_memory(config: ClientConfig, notices: Arc<dyn NoticeSink>) -> AppResult<Self> {
        Self::new(config, DbConfig::in_memory(), notices).await
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn orders(&self) -> &OrderService {
        &self.orders
    }

    pub fn cart(&self) -> &CartState {
        &self.cart
    }

    pub fn locations(&self) -> &LocationStore {
        &self.locations
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn notices(&self) -> &Arc<dyn NoticeSink> {
        &self.notices
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.config.retry)
    }

    // =========================================================================
    // Screen Factories
    // =========================================================================

    /// Where the signed-in user lands, per the configured routing table.
    pub async fn landing_destination(&self) -> AppResult<Option<String>> {
        Ok(self.auth.landing_destination(&self.config.routing).await?)
    }

    pub fn product_list(&self) -> ProductList {
        ProductList::products(self.api.clone(), self.retry_policy())
    }

    pub fn inventory_list(&self, query: ListQuery) -> InventoryList {
        InventoryList::inventory(self.api.clone(), query, self.retry_policy())
    }

    pub fn order_list(&self, query: ListQuery) -> OrderList {
        OrderList::orders(self.api.clone(), query, self.retry_policy())
    }

    pub fn checkout_deps(&self) -> CheckoutDeps {
        CheckoutDeps {
            api: self.api.clone(),
            locations: self.locations.clone(),
            session: self.session.clone(),
            cart: self.cart.shared(),
            notices: self.notices.clone(),
            settings: self.config.checkout.clone(),
        }
    }

    /// Starts checkout over the current cart.
    pub async fn begin_checkout(&self) -> CheckoutWorkflow {
        CheckoutWorkflow::begin(self.checkout_deps()).await
    }

    /// Closes the database pool.
    pub async fn shutdown(&self) {
        self.db.close().await;
    }
}
