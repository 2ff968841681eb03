//! End-to-end scenario tests for Storebridge.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storebridge-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `hierarchy_import` - Website / store / store view and vocabulary import
//! - `catalog_import` - Category tree, products, and catalog export
//! - `order_sync` - Order import windows and order status export
//! - `shipment_export` - Shipment creation, aggregation, and tracking
//! - `inventory_export` - Stock levels and tier prices
//!
//! The fixtures here pair the engine with [`MemoryStore`] and a scriptable
//! [`MockRemote`], so every scenario runs in-process: seed the remote side,
//! drive a pipeline, then assert on the store and on the calls the remote
//! recorded.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::SecretString;
use tokio::sync::Mutex;
use url::Url;

use storebridge_core::{ChannelId, PriceListId, RemoteId};
use storebridge_engine::SyncEngine;
use storebridge_engine::models::{
    Channel, DEFAULT_ORDER_PREFIX, DEFAULT_ROOT_CATEGORY, DEFAULT_UOM, PriceRule,
};
use storebridge_engine::remote::{
    Filter, FilterOp, FilterValue, InventoryUpdate, NewRemoteProduct, RemoteApi, RemoteCarrier,
    RemoteCategory, RemoteCategoryTree, RemoteFault, RemoteOrder, RemoteOrderLine,
    RemoteOrderState, RemoteOrderSummary, RemoteProduct, RemoteSession, RemoteStoreGroup,
    RemoteStoreView, RemoteWebsite, TierPriceEntry, TrackingInfo,
};
use storebridge_engine::store::LocalStore;
use storebridge_engine::store::memory::MemoryStore;

// =============================================================================
// Call Log
// =============================================================================

/// Everything the mock remote has been asked to do, in call order.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    /// Sessions opened through `connect`.
    pub sessions_opened: usize,
    /// Filters passed to `list_orders`.
    pub order_filters: Vec<Filter>,
    /// Inventory updates by remote product id.
    pub inventory: Vec<(RemoteId, InventoryUpdate)>,
    /// Tier price updates by remote product id.
    pub tier_prices: Vec<(RemoteId, Vec<TierPriceEntry>)>,
    /// Order status updates as (increment id, status).
    pub order_status: Vec<(String, String)>,
    /// Created shipments as (increment id, quantities by remote line id).
    pub shipments: Vec<(String, BTreeMap<String, Decimal>)>,
    /// Tracking pushes as (shipment ref, tracking info).
    pub tracking: Vec<(String, TrackingInfo)>,
    /// Products registered through `create_product`.
    pub products_created: Vec<NewRemoteProduct>,
}

// =============================================================================
// Mock Remote
// =============================================================================

#[derive(Default)]
struct RemoteState {
    connect_fault: Option<RemoteFault>,
    websites: Vec<RemoteWebsite>,
    store_groups: HashMap<i64, Vec<RemoteStoreGroup>>,
    store_views: HashMap<i64, Vec<RemoteStoreView>>,
    order_states: Vec<RemoteOrderState>,
    carriers: Vec<RemoteCarrier>,
    category_tree: Option<RemoteCategoryTree>,
    categories: BTreeMap<i64, RemoteCategory>,
    products: BTreeMap<i64, RemoteProduct>,
    orders: Vec<RemoteOrder>,
    inventory_faults: HashMap<i64, RemoteFault>,
    shipment_faults: HashMap<String, RemoteFault>,
    next_product_id: i64,
    next_shipment_ref: i64,
    calls: CallLog,
}

/// Scriptable in-process remote platform.
///
/// Seed it with fixture data, inject faults where a scenario needs them,
/// and read back the [`CallLog`] after driving the engine.
pub struct MockRemote {
    state: Arc<Mutex<RemoteState>>,
}

impl MockRemote {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(RemoteState {
                next_product_id: 500,
                next_shipment_ref: 300_000_001,
                ..RemoteState::default()
            })),
        }
    }

    /// Seed one website ("base") with one store group and two store views.
    pub async fn seed_hierarchy(&self) {
        let mut state = self.state.lock().await;
        state.websites = vec![RemoteWebsite {
            website_id: RemoteId::new(1),
            name: "Main Website".to_string(),
            code: "base".to_string(),
        }];
        state.store_groups.insert(
            1,
            vec![RemoteStoreGroup {
                group_id: RemoteId::new(1),
                name: "Main Store".to_string(),
            }],
        );
        state.store_views.insert(
            1,
            vec![
                RemoteStoreView {
                    store_id: RemoteId::new(1),
                    name: "Default Store View".to_string(),
                    code: "default".to_string(),
                },
                RemoteStoreView {
                    store_id: RemoteId::new(2),
                    name: "German".to_string(),
                    code: "de".to_string(),
                },
            ],
        );
    }

    /// Seed the order state vocabulary and two carriers.
    pub async fn seed_vocab(&self) {
        let mut state = self.state.lock().await;
        state.order_states = [
            ("new", "New"),
            ("processing", "Processing"),
            ("complete", "Complete"),
            ("canceled", "Canceled"),
        ]
        .into_iter()
        .map(|(code, name)| RemoteOrderState {
            code: code.to_string(),
            name: name.to_string(),
        })
        .collect();
        state.carriers = [
            ("ups", "United Parcel Service"),
            ("usps", "United States Postal Service"),
        ]
        .into_iter()
        .map(|(code, label)| RemoteCarrier {
            code: code.to_string(),
            label: label.to_string(),
        })
        .collect();
    }

    /// Seed the category tree (root 1 > 2 > Gear 3, Apparel 4) and three
    /// products: 101 under Gear, 102 under Apparel with a special price,
    /// and 103 without any category.
    pub async fn seed_catalog(&self) {
        let mut state = self.state.lock().await;
        state.category_tree = Some(RemoteCategoryTree {
            category_id: RemoteId::new(1),
            name: "Root Catalog".to_string(),
            children: vec![RemoteCategoryTree {
                category_id: RemoteId::new(2),
                name: "Default Category".to_string(),
                children: vec![
                    RemoteCategoryTree {
                        category_id: RemoteId::new(3),
                        name: "Gear".to_string(),
                        children: Vec::new(),
                    },
                    RemoteCategoryTree {
                        category_id: RemoteId::new(4),
                        name: "Apparel".to_string(),
                        children: Vec::new(),
                    },
                ],
            }],
        });
        for (id, name, parent) in [
            (1, "Root Catalog", None),
            (2, "Default Category", Some(1)),
            (3, "Gear", Some(2)),
            (4, "Apparel", Some(2)),
        ] {
            state.categories.insert(
                id,
                RemoteCategory {
                    category_id: RemoteId::new(id),
                    name: name.to_string(),
                    parent_id: parent.map(RemoteId::new),
                },
            );
        }
        for product in [
            remote_product(101, "GEAR-BOTTLE", "Steel Water Bottle", 2500, vec![3]),
            RemoteProduct {
                special_price: Some(Decimal::new(1450, 2)),
                ..remote_product(102, "APP-TEE", "Logo Tee", 1800, vec![4])
            },
            remote_product(103, "MISC-STICKER", "Sticker Pack", 600, Vec::new()),
        ] {
            state.products.insert(product.product_id.as_i64(), product);
        }
    }

    /// Add or replace a product by its remote id.
    pub async fn set_product(&self, product: RemoteProduct) {
        let mut state = self.state.lock().await;
        state.products.insert(product.product_id.as_i64(), product);
    }

    /// Add an order to the remote order book.
    pub async fn add_order(&self, order: RemoteOrder) {
        let mut state = self.state.lock().await;
        state.orders.push(order);
    }

    /// Make every `update_inventory` call for `product` fail with `fault`.
    pub async fn fail_inventory(&self, product: RemoteId, fault: RemoteFault) {
        let mut state = self.state.lock().await;
        state.inventory_faults.insert(product.as_i64(), fault);
    }

    /// Make every `create_shipment` call for `increment_id` fail with `fault`.
    pub async fn fail_shipment(&self, increment_id: &str, fault: RemoteFault) {
        let mut state = self.state.lock().await;
        state
            .shipment_faults
            .insert(increment_id.to_string(), fault);
    }

    /// Make `connect` itself fail with `fault`.
    pub async fn fail_connect(&self, fault: RemoteFault) {
        let mut state = self.state.lock().await;
        state.connect_fault = Some(fault);
    }

    /// Snapshot of everything the remote has been asked to do so far.
    pub async fn calls(&self) -> CallLog {
        self.state.lock().await.calls.clone()
    }
}

impl Default for MockRemote {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteApi for MockRemote {
    async fn connect(&self, _channel: &Channel) -> Result<Box<dyn RemoteSession>, RemoteFault> {
        let mut state = self.state.lock().await;
        if let Some(fault) = &state.connect_fault {
            return Err(fault.clone());
        }
        state.calls.sessions_opened += 1;
        Ok(Box::new(MockSession {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockSession {
    state: Arc<Mutex<RemoteState>>,
}

fn order_matches(filter: &Filter, order: &RemoteOrder) -> bool {
    filter.predicates().iter().all(|p| {
        match (p.field.as_str(), p.op, &p.value) {
            ("store_id", FilterOp::Eq, FilterValue::Int(id)) => order.store_id.as_i64() == *id,
            ("state", FilterOp::In, FilterValue::List(states)) => states.contains(&order.state),
            // The mock keeps no modification timestamps.
            _ => true,
        }
    })
}

#[async_trait]
impl RemoteSession for MockSession {
    async fn list_websites(&self) -> Result<Vec<RemoteWebsite>, RemoteFault> {
        Ok(self.state.lock().await.websites.clone())
    }

    async fn list_stores(&self, website: RemoteId) -> Result<Vec<RemoteStoreGroup>, RemoteFault> {
        Ok(self
            .state
            .lock()
            .await
            .store_groups
            .get(&website.as_i64())
            .cloned()
            .unwrap_or_default())
    }

    async fn list_store_views(&self, store: RemoteId) -> Result<Vec<RemoteStoreView>, RemoteFault> {
        Ok(self
            .state
            .lock()
            .await
            .store_views
            .get(&store.as_i64())
            .cloned()
            .unwrap_or_default())
    }

    async fn order_states(&self) -> Result<Vec<RemoteOrderState>, RemoteFault> {
        Ok(self.state.lock().await.order_states.clone())
    }

    async fn shipping_carriers(&self) -> Result<Vec<RemoteCarrier>, RemoteFault> {
        Ok(self.state.lock().await.carriers.clone())
    }

    async fn category_tree(&self, _root: RemoteId) -> Result<RemoteCategoryTree, RemoteFault> {
        self.state
            .lock()
            .await
            .category_tree
            .clone()
            .ok_or_else(|| RemoteFault::Api {
                code: 101,
                message: "Category tree not seeded.".to_string(),
            })
    }

    async fn category_info(&self, category: RemoteId) -> Result<RemoteCategory, RemoteFault> {
        self.state
            .lock()
            .await
            .categories
            .get(&category.as_i64())
            .cloned()
            .ok_or_else(|| RemoteFault::Api {
                code: 101,
                message: format!("Category {category} does not exist."),
            })
    }

    async fn list_products(&self) -> Result<Vec<RemoteProduct>, RemoteFault> {
        Ok(self.state.lock().await.products.values().cloned().collect())
    }

    async fn product_info(&self, product: RemoteId) -> Result<RemoteProduct, RemoteFault> {
        self.state
            .lock()
            .await
            .products
            .get(&product.as_i64())
            .cloned()
            .ok_or_else(|| RemoteFault::Api {
                code: 101,
                message: format!("Product {product} does not exist."),
            })
    }

    async fn create_product(&self, product: NewRemoteProduct) -> Result<RemoteId, RemoteFault> {
        let mut state = self.state.lock().await;
        let id = state.next_product_id;
        state.next_product_id += 1;
        state.calls.products_created.push(product.clone());
        state.products.insert(
            id,
            RemoteProduct {
                product_id: RemoteId::new(id),
                sku: Some(product.sku),
                name: Some(product.name),
                description: Some(product.description),
                product_type: product.product_type,
                price: Some(product.price),
                special_price: None,
                cost: None,
                categories: product.categories,
            },
        );
        Ok(RemoteId::new(id))
    }

    async fn list_orders(&self, filter: &Filter) -> Result<Vec<RemoteOrderSummary>, RemoteFault> {
        let mut state = self.state.lock().await;
        state.calls.order_filters.push(filter.clone());
        Ok(state
            .orders
            .iter()
            .filter(|order| order_matches(filter, order))
            .map(|order| RemoteOrderSummary {
                increment_id: order.increment_id.clone(),
                state: order.state.clone(),
            })
            .collect())
    }

    async fn order_info(&self, increment_id: &str) -> Result<RemoteOrder, RemoteFault> {
        self.state
            .lock()
            .await
            .orders
            .iter()
            .find(|order| order.increment_id == increment_id)
            .cloned()
            .ok_or_else(|| RemoteFault::Api {
                code: 100,
                message: "Requested order not exists.".to_string(),
            })
    }

    async fn update_inventory(
        &self,
        product: RemoteId,
        update: InventoryUpdate,
    ) -> Result<(), RemoteFault> {
        let mut state = self.state.lock().await;
        if let Some(fault) = state.inventory_faults.get(&product.as_i64()) {
            return Err(fault.clone());
        }
        state.calls.inventory.push((product, update));
        Ok(())
    }

    async fn update_tier_prices(
        &self,
        product: RemoteId,
        tiers: &[TierPriceEntry],
    ) -> Result<(), RemoteFault> {
        let mut state = self.state.lock().await;
        state.calls.tier_prices.push((product, tiers.to_vec()));
        Ok(())
    }

    async fn update_order_status(
        &self,
        increment_id: &str,
        status: &str,
    ) -> Result<(), RemoteFault> {
        let mut state = self.state.lock().await;
        state
            .calls
            .order_status
            .push((increment_id.to_string(), status.to_string()));
        Ok(())
    }

    async fn create_shipment(
        &self,
        increment_id: &str,
        quantities: &BTreeMap<String, Decimal>,
    ) -> Result<String, RemoteFault> {
        let mut state = self.state.lock().await;
        if let Some(fault) = state.shipment_faults.get(increment_id) {
            return Err(fault.clone());
        }
        let shipment_ref = state.next_shipment_ref.to_string();
        state.next_shipment_ref += 1;
        state
            .calls
            .shipments
            .push((increment_id.to_string(), quantities.clone()));
        Ok(shipment_ref)
    }

    async fn add_shipment_tracking(
        &self,
        shipment_ref: &str,
        tracking: TrackingInfo,
    ) -> Result<(), RemoteFault> {
        let mut state = self.state.lock().await;
        state
            .calls
            .tracking
            .push((shipment_ref.to_string(), tracking));
        Ok(())
    }
}

// =============================================================================
// Test Context
// =============================================================================

/// Engine wired to a [`MemoryStore`] and a [`MockRemote`].
pub struct TestContext {
    pub engine: SyncEngine,
    pub store: Arc<MemoryStore>,
    pub remote: Arc<MockRemote>,
}

impl TestContext {
    /// Context over a fresh, unseeded remote.
    pub async fn new() -> Self {
        Self::with_remote(Arc::new(MockRemote::new())).await
    }

    /// Context over a caller-scripted remote.
    pub async fn with_remote(remote: Arc<MockRemote>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let price_list = store
            .insert_price_list(
                "Channel Retail",
                vec![PriceRule {
                    min_quantity: Decimal::from(10),
                    percent_discount: Decimal::from(10),
                }],
            )
            .await;
        let local: Arc<dyn LocalStore> = store.clone();
        let api: Arc<dyn RemoteApi> = remote.clone();
        let engine = SyncEngine::new(channel_fixture(price_list.id), local, api);
        Self {
            engine,
            store,
            remote,
        }
    }
}

// =============================================================================
// Fixture builders
// =============================================================================

/// The channel every scenario runs on: prefix `mag_`, root category 1.
#[must_use]
pub fn channel_fixture(price_list_id: PriceListId) -> Channel {
    Channel {
        id: ChannelId::new(1),
        name: "primary".to_string(),
        endpoint: Url::parse("https://shop.example.com/api/xmlrpc")
            .expect("fixture endpoint is valid"),
        api_user: "bridge".to_string(),
        api_key: SecretString::from("k9mK2nL5pQ7rT0uW4zC6"),
        order_prefix: DEFAULT_ORDER_PREFIX.to_string(),
        default_uom: DEFAULT_UOM.to_string(),
        account_expense: "Main Expense".to_string(),
        account_revenue: "Main Revenue".to_string(),
        root_category: DEFAULT_ROOT_CATEGORY,
        price_list_id,
    }
}

/// A remote product with a price in cents and category ids.
#[must_use]
pub fn remote_product(
    id: i64,
    sku: &str,
    name: &str,
    price_cents: i64,
    categories: Vec<i64>,
) -> RemoteProduct {
    RemoteProduct {
        product_id: RemoteId::new(id),
        sku: Some(sku.to_string()),
        name: Some(name.to_string()),
        description: None,
        product_type: "simple".to_string(),
        price: Some(Decimal::new(price_cents, 2)),
        special_price: None,
        cost: None,
        categories: categories.into_iter().map(RemoteId::new).collect(),
    }
}

/// A remote order for store view `store` with the given lines.
#[must_use]
pub fn remote_order(
    order_id: i64,
    increment_id: &str,
    state: &str,
    store: i64,
    lines: Vec<RemoteOrderLine>,
) -> RemoteOrder {
    RemoteOrder {
        order_id: RemoteId::new(order_id),
        increment_id: increment_id.to_string(),
        state: state.to_string(),
        store_id: RemoteId::new(store),
        lines,
    }
}

/// A remote order line with a whole quantity and a price in cents.
#[must_use]
pub fn remote_order_line(
    item_id: i64,
    product: i64,
    sku: &str,
    qty: i64,
    price_cents: i64,
) -> RemoteOrderLine {
    RemoteOrderLine {
        item_id: RemoteId::new(item_id),
        product_id: Some(RemoteId::new(product)),
        sku: Some(sku.to_string()),
        name: sku.to_string(),
        qty_ordered: Decimal::from(qty),
        price: Decimal::new(price_cents, 2),
        tax_percent: None,
    }
}
