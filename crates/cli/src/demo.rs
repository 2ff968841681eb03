//! In-process demo environment: a canned remote platform and a seeded store.
//!
//! The engine is transport-agnostic, so the CLI stands up its own remote
//! side here. [`DemoRemote`] answers every session call with a small fixed
//! storefront (one website, two store views, a three-level category tree,
//! three products, two open orders) and logs whatever the engine pushes
//! back at it. [`DemoEnv`] pairs it with a [`MemoryStore`] and seeds the
//! local fixtures the export pipelines need.

use std::collections::BTreeMap;
use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use secrecy::SecretString;
use tracing::{debug, info};
use url::Url;

use storebridge_core::{
    ChannelId, FulfillmentState, OrderWorkflowState, RemoteId, ShipmentState, StoreId,
};
use storebridge_engine::SyncEngine;
use storebridge_engine::config::{ChannelConfig, ConfigError};
use storebridge_engine::models::{
    Channel, DEFAULT_ORDER_PREFIX, DEFAULT_ROOT_CATEGORY, DEFAULT_UOM, LocationKind, PriceRule,
    Product, ShipmentLine,
};
use storebridge_engine::remote::{
    Filter, InventoryUpdate, NewRemoteProduct, RemoteApi, RemoteCarrier, RemoteCategory,
    RemoteCategoryTree, RemoteFault, RemoteOrder, RemoteOrderLine, RemoteOrderState,
    RemoteOrderSummary, RemoteProduct, RemoteSession, RemoteStoreGroup, RemoteStoreView,
    RemoteWebsite, TierPriceEntry, TrackingInfo,
};
use storebridge_engine::store::LocalStore;
use storebridge_engine::store::memory::MemoryStore;

// =============================================================================
// Demo remote
// =============================================================================

/// Remote API factory backed by canned fixture data.
pub struct DemoRemote {
    products: Arc<AtomicI64>,
    shipments: Arc<AtomicI64>,
}

impl DemoRemote {
    #[must_use]
    pub fn new() -> Self {
        Self {
            products: Arc::new(AtomicI64::new(500)),
            shipments: Arc::new(AtomicI64::new(300_000_001)),
        }
    }
}

impl Default for DemoRemote {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteApi for DemoRemote {
    async fn connect(&self, channel: &Channel) -> Result<Box<dyn RemoteSession>, RemoteFault> {
        debug!(endpoint = %channel.endpoint, user = %channel.api_user, "Demo session opened");
        Ok(Box::new(DemoSession {
            products: Arc::clone(&self.products),
            shipments: Arc::clone(&self.shipments),
        }))
    }
}

struct DemoSession {
    products: Arc<AtomicI64>,
    shipments: Arc<AtomicI64>,
}

fn demo_products() -> Vec<RemoteProduct> {
    vec![
        RemoteProduct {
            product_id: RemoteId::new(101),
            sku: Some("GEAR-BOTTLE".to_string()),
            name: Some("Steel Water Bottle".to_string()),
            description: Some("Insulated 750ml bottle".to_string()),
            product_type: "simple".to_string(),
            price: Some(Decimal::new(2500, 2)),
            special_price: None,
            cost: Some(Decimal::new(1100, 2)),
            categories: vec![RemoteId::new(3)],
        },
        RemoteProduct {
            product_id: RemoteId::new(102),
            sku: Some("APP-TEE".to_string()),
            name: Some("Logo Tee".to_string()),
            description: None,
            product_type: "simple".to_string(),
            price: Some(Decimal::new(1800, 2)),
            special_price: Some(Decimal::new(1450, 2)),
            cost: None,
            categories: vec![RemoteId::new(4)],
        },
        // No category on purpose: lands under the unclassified fallback.
        RemoteProduct {
            product_id: RemoteId::new(103),
            sku: Some("MISC-STICKER".to_string()),
            name: Some("Sticker Pack".to_string()),
            description: None,
            product_type: "simple".to_string(),
            price: Some(Decimal::new(600, 2)),
            special_price: None,
            cost: None,
            categories: Vec::new(),
        },
    ]
}

#[async_trait]
impl RemoteSession for DemoSession {
    async fn list_websites(&self) -> Result<Vec<RemoteWebsite>, RemoteFault> {
        Ok(vec![RemoteWebsite {
            website_id: RemoteId::new(1),
            name: "Main Website".to_string(),
            code: "base".to_string(),
        }])
    }

    async fn list_stores(&self, _website: RemoteId) -> Result<Vec<RemoteStoreGroup>, RemoteFault> {
        Ok(vec![RemoteStoreGroup {
            group_id: RemoteId::new(1),
            name: "Main Store".to_string(),
        }])
    }

    async fn list_store_views(
        &self,
        _store: RemoteId,
    ) -> Result<Vec<RemoteStoreView>, RemoteFault> {
        Ok(vec![
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
        ])
    }

    async fn order_states(&self) -> Result<Vec<RemoteOrderState>, RemoteFault> {
        Ok([
            ("new", "New"),
            ("processing", "Processing"),
            ("holded", "On Hold"),
            ("complete", "Complete"),
            ("closed", "Closed"),
            ("canceled", "Canceled"),
        ]
        .into_iter()
        .map(|(code, name)| RemoteOrderState {
            code: code.to_string(),
            name: name.to_string(),
        })
        .collect())
    }

    async fn shipping_carriers(&self) -> Result<Vec<RemoteCarrier>, RemoteFault> {
        Ok([
            ("ups", "United Parcel Service"),
            ("usps", "United States Postal Service"),
            ("fedex", "Federal Express"),
        ]
        .into_iter()
        .map(|(code, label)| RemoteCarrier {
            code: code.to_string(),
            label: label.to_string(),
        })
        .collect())
    }

    async fn category_tree(&self, root: RemoteId) -> Result<RemoteCategoryTree, RemoteFault> {
        Ok(RemoteCategoryTree {
            category_id: root,
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
        })
    }

    async fn category_info(&self, category: RemoteId) -> Result<RemoteCategory, RemoteFault> {
        let (name, parent) = match category.as_i64() {
            1 => ("Root Catalog", None),
            2 => ("Default Category", Some(1)),
            3 => ("Gear", Some(2)),
            4 => ("Apparel", Some(2)),
            _ => {
                return Err(RemoteFault::Api {
                    code: 101,
                    message: format!("Category {category} does not exist."),
                });
            }
        };
        Ok(RemoteCategory {
            category_id: category,
            name: name.to_string(),
            parent_id: parent.map(RemoteId::new),
        })
    }

    async fn list_products(&self) -> Result<Vec<RemoteProduct>, RemoteFault> {
        Ok(demo_products())
    }

    async fn product_info(&self, product: RemoteId) -> Result<RemoteProduct, RemoteFault> {
        demo_products()
            .into_iter()
            .find(|p| p.product_id == product)
            .ok_or_else(|| RemoteFault::Api {
                code: 101,
                message: format!("Product {product} does not exist."),
            })
    }

    async fn create_product(&self, product: NewRemoteProduct) -> Result<RemoteId, RemoteFault> {
        let id = self.products.fetch_add(1, Ordering::SeqCst);
        info!(
            sku = %product.sku,
            name = %product.name,
            remote = id,
            "Demo remote accepted new product"
        );
        Ok(RemoteId::new(id))
    }

    async fn list_orders(&self, filter: &Filter) -> Result<Vec<RemoteOrderSummary>, RemoteFault> {
        debug!(?filter, "Demo remote listing orders");
        Ok(vec![
            RemoteOrderSummary {
                increment_id: "100000001".to_string(),
                state: "new".to_string(),
            },
            RemoteOrderSummary {
                increment_id: "100000002".to_string(),
                state: "processing".to_string(),
            },
        ])
    }

    async fn order_info(&self, increment_id: &str) -> Result<RemoteOrder, RemoteFault> {
        match increment_id {
            "100000001" => Ok(RemoteOrder {
                order_id: RemoteId::new(9001),
                increment_id: increment_id.to_string(),
                state: "new".to_string(),
                store_id: RemoteId::new(1),
                lines: vec![
                    RemoteOrderLine {
                        item_id: RemoteId::new(7001),
                        product_id: Some(RemoteId::new(101)),
                        sku: Some("GEAR-BOTTLE".to_string()),
                        name: "Steel Water Bottle".to_string(),
                        qty_ordered: Decimal::from(2),
                        price: Decimal::new(2500, 2),
                        tax_percent: Some(Decimal::from(19)),
                    },
                    RemoteOrderLine {
                        item_id: RemoteId::new(7002),
                        product_id: Some(RemoteId::new(103)),
                        sku: Some("MISC-STICKER".to_string()),
                        name: "Sticker Pack".to_string(),
                        qty_ordered: Decimal::from(3),
                        price: Decimal::new(600, 2),
                        tax_percent: None,
                    },
                ],
            }),
            "100000002" => Ok(RemoteOrder {
                order_id: RemoteId::new(9002),
                increment_id: increment_id.to_string(),
                state: "processing".to_string(),
                store_id: RemoteId::new(1),
                lines: vec![RemoteOrderLine {
                    item_id: RemoteId::new(7003),
                    product_id: Some(RemoteId::new(102)),
                    sku: Some("APP-TEE".to_string()),
                    name: "Logo Tee".to_string(),
                    qty_ordered: Decimal::ONE,
                    price: Decimal::new(1450, 2),
                    tax_percent: None,
                }],
            }),
            _ => Err(RemoteFault::Api {
                code: 100,
                message: "Requested order not exists.".to_string(),
            }),
        }
    }

    async fn update_inventory(
        &self,
        product: RemoteId,
        update: InventoryUpdate,
    ) -> Result<(), RemoteFault> {
        info!(
            remote = %product,
            qty = %update.qty,
            in_stock = update.is_in_stock,
            "Demo remote received inventory update"
        );
        Ok(())
    }

    async fn update_tier_prices(
        &self,
        product: RemoteId,
        tiers: &[TierPriceEntry],
    ) -> Result<(), RemoteFault> {
        info!(
            remote = %product,
            tiers = tiers.len(),
            "Demo remote received tier prices"
        );
        for tier in tiers {
            debug!(qty = %tier.quantity, price = %tier.price, "Tier");
        }
        Ok(())
    }

    async fn update_order_status(
        &self,
        increment_id: &str,
        status: &str,
    ) -> Result<(), RemoteFault> {
        info!(increment_id, status, "Demo remote received order status");
        Ok(())
    }

    async fn create_shipment(
        &self,
        increment_id: &str,
        quantities: &BTreeMap<String, Decimal>,
    ) -> Result<String, RemoteFault> {
        let shipment_ref = self.shipments.fetch_add(1, Ordering::SeqCst).to_string();
        info!(
            increment_id,
            shipment_ref,
            lines = quantities.len(),
            "Demo remote created shipment"
        );
        Ok(shipment_ref)
    }

    async fn add_shipment_tracking(
        &self,
        shipment_ref: &str,
        tracking: TrackingInfo,
    ) -> Result<(), RemoteFault> {
        info!(
            shipment_ref,
            carrier = %tracking.carrier_code,
            number = %tracking.tracking_number,
            "Demo remote received tracking info"
        );
        Ok(())
    }
}

// =============================================================================
// Demo environment
// =============================================================================

/// A sync engine wired to the demo remote over a seeded in-memory store.
pub struct DemoEnv {
    pub store: Arc<MemoryStore>,
    pub engine: SyncEngine,
}

impl DemoEnv {
    /// Stand up the store, the channel, and the engine.
    ///
    /// # Errors
    ///
    /// Returns an error when `BRIDGE_*` variables are present but invalid.
    pub async fn new() -> Result<Self, Box<dyn Error>> {
        let store = Arc::new(MemoryStore::new());
        let price_list = store
            .insert_price_list(
                "Demo Retail",
                vec![
                    PriceRule {
                        min_quantity: Decimal::from(10),
                        percent_discount: Decimal::from(5),
                    },
                    PriceRule {
                        min_quantity: Decimal::from(50),
                        percent_discount: Decimal::from(10),
                    },
                ],
            )
            .await;

        let channel = channel_config()?.into_channel(ChannelId::new(1), price_list.id);
        let engine_store: Arc<dyn LocalStore> = store.clone();
        let engine = SyncEngine::new(channel, engine_store, Arc::new(DemoRemote::new()));
        Ok(Self { store, engine })
    }

    /// The first imported store, for store-scoped exports.
    ///
    /// # Errors
    ///
    /// Returns an error when the hierarchy has not been imported yet.
    pub async fn first_store(&self) -> Result<StoreId, Box<dyn Error>> {
        let views = self
            .store
            .store_views(self.engine.channel().id)
            .await?;
        views
            .first()
            .map(|view| view.store_id)
            .ok_or_else(|| "no store imported yet; run the hierarchy import first".into())
    }

    /// Seed warehouse stock for every listed product.
    ///
    /// # Errors
    ///
    /// Returns an error when the store rejects a lookup.
    pub async fn seed_stock(&self) -> Result<(), Box<dyn Error>> {
        let storage = self
            .store
            .insert_location("Main Storage", LocationKind::Storage)
            .await;
        let listings = self.store.listings(self.engine.channel().id).await?;
        // One product is left at zero so the out-of-stock path shows up too.
        for (listing, qty) in listings.iter().zip([12_i64, 0, 40].iter().cycle()) {
            self.store
                .set_stock(storage.id, listing.product_id, Decimal::from(*qty))
                .await;
        }
        Ok(())
    }

    /// Seed store-level default tiers and product tiers on the first listing.
    ///
    /// # Errors
    ///
    /// Returns an error when the store rejects a lookup.
    pub async fn seed_tiers(&self, store: StoreId) -> Result<(), Box<dyn Error>> {
        self.store
            .set_store_tiers(store, vec![Decimal::from(10)])
            .await;
        let listings = self.store.listings(self.engine.channel().id).await?;
        if let Some(first) = listings.first() {
            self.store
                .set_product_tiers(first.product_id, vec![Decimal::from(5), Decimal::from(25)])
                .await;
        }
        Ok(())
    }

    /// Dispatch the first imported demo order: mark it sent, attach a packed
    /// shipment with a tracking number, and enable tracking export on its
    /// store view.
    ///
    /// # Errors
    ///
    /// Returns an error when the demo order has not been imported yet.
    pub async fn seed_dispatch(&self) -> Result<(), Box<dyn Error>> {
        let channel = self.engine.channel();
        let reference = channel.order_reference("100000001");
        let order = self
            .store
            .order_by_reference(channel.id, &reference)
            .await?
            .ok_or("demo order not imported yet; run the order import first")?;
        let carrier = self
            .store
            .carrier_by_code(channel.id, "ups")
            .await?
            .map(|c| c.id);

        let lines: Vec<ShipmentLine> = order
            .lines
            .iter()
            .map(|line| ShipmentLine {
                order_line_id: line.id,
                quantity: line.quantity,
            })
            .collect();
        self.store
            .insert_shipment(
                order.id,
                ShipmentState::Packed,
                carrier,
                Some("1Z999AA10123456784".to_string()),
                lines,
            )
            .await;
        self.store
            .advance_order(
                order.id,
                OrderWorkflowState::Processing,
                FulfillmentState::Sent,
                Utc::now(),
            )
            .await?;
        self.store
            .set_view_export_tracking(order.store_view_id, true)
            .await?;
        Ok(())
    }

    /// Seed a local-only product filed under an already-linked category.
    ///
    /// # Errors
    ///
    /// Returns an error when the catalog has not been imported yet.
    pub async fn seed_unlisted_product(&self) -> Result<Product, Box<dyn Error>> {
        let category = self
            .store
            .category_by_name("Gear")
            .await?
            .ok_or("category tree not imported yet; run the catalog import first")?;
        Ok(self
            .store
            .insert_unlisted_product(
                "Demo Travel Mug",
                Some("GEAR-MUG"),
                category.id,
                Decimal::new(2200, 2),
            )
            .await)
    }
}

// =============================================================================
// Channel configuration
// =============================================================================

/// Load the channel from `BRIDGE_*` variables, falling back to the demo
/// channel when the environment is not configured.
fn channel_config() -> Result<ChannelConfig, Box<dyn Error>> {
    match ChannelConfig::from_env() {
        Ok(config) => Ok(config),
        Err(ConfigError::MissingEnvVar(var)) => {
            debug!(var, "BRIDGE_* environment incomplete, using the demo channel");
            Ok(ChannelConfig {
                name: "demo".to_string(),
                endpoint: Url::parse("https://demo-shop.invalid/api/xmlrpc")?,
                api_user: "bridge".to_string(),
                api_key: SecretString::from("demo-session-0nly-k3y"),
                order_prefix: DEFAULT_ORDER_PREFIX.to_string(),
                default_uom: DEFAULT_UOM.to_string(),
                account_expense: "Main Expense".to_string(),
                account_revenue: "Main Revenue".to_string(),
                root_category: DEFAULT_ROOT_CATEGORY,
            })
        }
        Err(err) => Err(err.into()),
    }
}
