//! In-memory [`LocalStore`] backing tests and the demo CLI.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use storebridge_core::{
    CarrierId, CategoryId, ChannelId, FulfillmentState, IssueId, ListingId, OrderId, OrderLineId,
    OrderStateId, OrderWorkflowState, PriceListId, ProductId, RemoteId, ShipmentId, ShipmentState,
    StockLocationId, StoreId, StoreViewId, WebsiteId,
};

use crate::models::{
    CarrierRecord, Category, CategoryLink, CreateCarrierInput, CreateCategoryInput,
    CreateIssueInput, CreateListingInput, CreateOrderInput, CreateOrderStateInput,
    CreateProductInput, CreateStoreInput, CreateStoreViewInput, CreateWebsiteInput, Listing,
    LocationKind, Order, OrderFilter, OrderLine, OrderStateRecord, PriceList, PriceRule,
    PriceTier, Product, Shipment, ShipmentLine, StockLevel, StockLocation, Store, StoreView,
    SyncIssue, TaxRule, UNCLASSIFIED_CATEGORY, Website,
};
use crate::store::{LocalStore, StoreError};
use crate::watermark::{SyncScope, WatermarkKind};

/// All state of one [`MemoryStore`].
#[derive(Debug, Default)]
struct Inner {
    next_id: i32,
    websites: Vec<Website>,
    stores: Vec<Store>,
    store_views: Vec<StoreView>,
    categories: Vec<Category>,
    category_links: Vec<CategoryLink>,
    products: Vec<Product>,
    listings: Vec<Listing>,
    price_lists: Vec<PriceList>,
    product_tiers: HashMap<ProductId, Vec<PriceTier>>,
    store_tiers: HashMap<StoreId, Vec<PriceTier>>,
    locations: Vec<StockLocation>,
    stock: Vec<StockLevel>,
    order_states: Vec<OrderStateRecord>,
    carriers: Vec<CarrierRecord>,
    orders: Vec<Order>,
    shipments: Vec<Shipment>,
    watermarks: BTreeMap<(SyncScope, WatermarkKind), DateTime<Utc>>,
    issues: Vec<SyncIssue>,
}

impl Inner {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

/// An in-memory system of record.
///
/// Every store starts with the fallback category for unclassified imports
/// already present. Ids are assigned from one counter across all entity
/// types.
#[derive(Debug)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store with the fallback category seeded.
    #[must_use]
    pub fn new() -> Self {
        let mut inner = Inner::default();
        let id = inner.next_id();
        inner.categories.push(Category {
            id: CategoryId::new(id),
            name: UNCLASSIFIED_CATEGORY.to_string(),
            parent_id: None,
        });
        Self {
            inner: RwLock::new(inner),
        }
    }

    // ==========================================================================
    // Fixture helpers
    // ==========================================================================

    /// Insert a price list.
    pub async fn insert_price_list(&self, name: &str, rules: Vec<PriceRule>) -> PriceList {
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        let list = PriceList {
            id: PriceListId::new(id),
            name: name.to_string(),
            rules,
        };
        inner.price_lists.push(list.clone());
        list
    }

    /// Insert a stock location.
    pub async fn insert_location(&self, name: &str, kind: LocationKind) -> StockLocation {
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        let location = StockLocation {
            id: StockLocationId::new(id),
            name: name.to_string(),
            kind,
        };
        inner.locations.push(location.clone());
        location
    }

    /// Set the stock level of a product at a location.
    pub async fn set_stock(
        &self,
        location: StockLocationId,
        product: ProductId,
        quantity: Decimal,
    ) {
        let mut inner = self.inner.write().await;
        if let Some(level) = inner
            .stock
            .iter_mut()
            .find(|level| level.location_id == location && level.product_id == product)
        {
            level.quantity = quantity;
        } else {
            inner.stock.push(StockLevel {
                location_id: location,
                product_id: product,
                quantity,
            });
        }
    }

    /// Set the tier quantity breaks of a product.
    pub async fn set_product_tiers(&self, product: ProductId, quantities: Vec<Decimal>) {
        let tiers = quantities
            .into_iter()
            .map(|quantity| PriceTier { quantity })
            .collect();
        self.inner.write().await.product_tiers.insert(product, tiers);
    }

    /// Set the default tier quantity breaks of a store.
    pub async fn set_store_tiers(&self, store: StoreId, quantities: Vec<Decimal>) {
        let tiers = quantities
            .into_iter()
            .map(|quantity| PriceTier { quantity })
            .collect();
        self.inner.write().await.store_tiers.insert(store, tiers);
    }

    /// Point a store at a different price list.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown store id.
    pub async fn set_store_price_list(
        &self,
        store: StoreId,
        price_list: PriceListId,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let row = inner
            .stores
            .iter_mut()
            .find(|s| s.id == store)
            .ok_or(StoreError::NotFound)?;
        row.price_list_id = price_list;
        Ok(())
    }

    /// Insert a product without listing it on any channel.
    pub async fn insert_unlisted_product(
        &self,
        name: &str,
        code: Option<&str>,
        category: CategoryId,
        list_price: Decimal,
    ) -> Product {
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        let product = Product {
            id: ProductId::new(id),
            name: name.to_string(),
            code: code.map(ToString::to_string),
            description: None,
            category_id: category,
            list_price,
            cost_price: Decimal::ZERO,
            uom: "Unit".to_string(),
            account_expense: "Main Expense".to_string(),
            account_revenue: "Main Revenue".to_string(),
            salable: true,
        };
        inner.products.push(product.clone());
        product
    }

    /// Insert a shipment for an order.
    pub async fn insert_shipment(
        &self,
        order: OrderId,
        state: ShipmentState,
        carrier: Option<CarrierId>,
        tracking_number: Option<String>,
        lines: Vec<ShipmentLine>,
    ) -> Shipment {
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        let shipment = Shipment {
            id: ShipmentId::new(id),
            order_id: order,
            state,
            carrier_id: carrier,
            tracking_number,
            remote_ref: None,
            tracking_exported: false,
            lines,
        };
        inner.shipments.push(shipment.clone());
        shipment
    }

    /// Move an order through its workflow.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown order id.
    pub async fn advance_order(
        &self,
        order: OrderId,
        state: OrderWorkflowState,
        fulfillment: FulfillmentState,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let row = inner
            .orders
            .iter_mut()
            .find(|o| o.id == order)
            .ok_or(StoreError::NotFound)?;
        row.state = state;
        row.fulfillment_state = fulfillment;
        row.updated_at = updated_at;
        Ok(())
    }

    /// Toggle tracking export for a store view.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown view id.
    pub async fn set_view_export_tracking(
        &self,
        view: StoreViewId,
        enabled: bool,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let row = inner
            .store_views
            .iter_mut()
            .find(|v| v.id == view)
            .ok_or(StoreError::NotFound)?;
        row.export_tracking = enabled;
        Ok(())
    }

    /// Configure the tax rules of a store view.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown view id.
    pub async fn set_view_taxes(
        &self,
        view: StoreViewId,
        taxes: Vec<TaxRule>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let row = inner
            .store_views
            .iter_mut()
            .find(|v| v.id == view)
            .ok_or(StoreError::NotFound)?;
        row.taxes = taxes;
        Ok(())
    }

    /// All recorded sync issues, oldest first.
    pub async fn issues(&self) -> Vec<SyncIssue> {
        self.inner.read().await.issues.clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocalStore for MemoryStore {
    async fn website_by_remote(
        &self,
        channel: ChannelId,
        remote: RemoteId,
    ) -> Result<Option<Website>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .websites
            .iter()
            .find(|w| w.channel_id == channel && w.remote_id == remote)
            .cloned())
    }

    async fn create_website(&self, input: CreateWebsiteInput) -> Result<Website, StoreError> {
        let mut inner = self.inner.write().await;
        if inner
            .websites
            .iter()
            .any(|w| w.channel_id == input.channel_id && w.remote_id == input.remote_id)
        {
            return Err(StoreError::Conflict(format!(
                "duplicate website remote id {}",
                input.remote_id
            )));
        }
        let id = inner.next_id();
        let website = Website {
            id: WebsiteId::new(id),
            channel_id: input.channel_id,
            remote_id: input.remote_id,
            name: input.name,
            code: input.code,
        };
        inner.websites.push(website.clone());
        Ok(website)
    }

    async fn websites(&self, channel: ChannelId) -> Result<Vec<Website>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .websites
            .iter()
            .filter(|w| w.channel_id == channel)
            .cloned()
            .collect())
    }

    async fn store_by_remote(
        &self,
        website: WebsiteId,
        remote: RemoteId,
    ) -> Result<Option<Store>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .stores
            .iter()
            .find(|s| s.website_id == website && s.remote_id == remote)
            .cloned())
    }

    async fn create_store(&self, input: CreateStoreInput) -> Result<Store, StoreError> {
        let mut inner = self.inner.write().await;
        if inner
            .stores
            .iter()
            .any(|s| s.website_id == input.website_id && s.remote_id == input.remote_id)
        {
            return Err(StoreError::Conflict(format!(
                "duplicate store remote id {}",
                input.remote_id
            )));
        }
        let id = inner.next_id();
        let store = Store {
            id: StoreId::new(id),
            website_id: input.website_id,
            channel_id: input.channel_id,
            remote_id: input.remote_id,
            name: input.name,
            price_list_id: input.price_list_id,
        };
        inner.stores.push(store.clone());
        Ok(store)
    }

    async fn store(&self, store: StoreId) -> Result<Store, StoreError> {
        let inner = self.inner.read().await;
        inner
            .stores
            .iter()
            .find(|s| s.id == store)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn store_view_by_remote(
        &self,
        store: StoreId,
        remote: RemoteId,
    ) -> Result<Option<StoreView>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .store_views
            .iter()
            .find(|v| v.store_id == store && v.remote_id == remote)
            .cloned())
    }

    async fn create_store_view(
        &self,
        input: CreateStoreViewInput,
    ) -> Result<StoreView, StoreError> {
        let mut inner = self.inner.write().await;
        if inner
            .store_views
            .iter()
            .any(|v| v.store_id == input.store_id && v.remote_id == input.remote_id)
        {
            return Err(StoreError::Conflict(format!(
                "duplicate store view remote id {}",
                input.remote_id
            )));
        }
        let id = inner.next_id();
        let view = StoreView {
            id: StoreViewId::new(id),
            store_id: input.store_id,
            website_id: input.website_id,
            channel_id: input.channel_id,
            remote_id: input.remote_id,
            name: input.name,
            code: input.code,
            export_tracking: false,
            taxes: Vec::new(),
        };
        inner.store_views.push(view.clone());
        Ok(view)
    }

    async fn store_views(&self, channel: ChannelId) -> Result<Vec<StoreView>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .store_views
            .iter()
            .filter(|v| v.channel_id == channel)
            .cloned()
            .collect())
    }

    async fn store_view(&self, view: StoreViewId) -> Result<StoreView, StoreError> {
        let inner = self.inner.read().await;
        inner
            .store_views
            .iter()
            .find(|v| v.id == view)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn category(&self, category: CategoryId) -> Result<Category, StoreError> {
        let inner = self.inner.read().await;
        inner
            .categories
            .iter()
            .find(|c| c.id == category)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn category_by_name(&self, name: &str) -> Result<Option<Category>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.categories.iter().find(|c| c.name == name).cloned())
    }

    async fn create_category(&self, input: CreateCategoryInput) -> Result<Category, StoreError> {
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        let category = Category {
            id: CategoryId::new(id),
            name: input.name,
            parent_id: input.parent_id,
        };
        inner.categories.push(category.clone());
        Ok(category)
    }

    async fn create_linked_category(
        &self,
        channel: ChannelId,
        remote: RemoteId,
        input: CreateCategoryInput,
    ) -> Result<Category, StoreError> {
        let mut inner = self.inner.write().await;
        if inner
            .category_links
            .iter()
            .any(|l| l.channel_id == channel && l.remote_id == remote)
        {
            return Err(StoreError::Conflict(format!(
                "category {remote} already linked"
            )));
        }
        let id = inner.next_id();
        let category = Category {
            id: CategoryId::new(id),
            name: input.name,
            parent_id: input.parent_id,
        };
        inner.categories.push(category.clone());
        inner.category_links.push(CategoryLink {
            channel_id: channel,
            remote_id: remote,
            category_id: category.id,
        });
        Ok(category)
    }

    async fn category_link(
        &self,
        channel: ChannelId,
        remote: RemoteId,
    ) -> Result<Option<CategoryLink>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .category_links
            .iter()
            .find(|l| l.channel_id == channel && l.remote_id == remote)
            .copied())
    }

    async fn category_link_for(
        &self,
        channel: ChannelId,
        category: CategoryId,
    ) -> Result<Option<CategoryLink>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .category_links
            .iter()
            .find(|l| l.channel_id == channel && l.category_id == category)
            .copied())
    }

    async fn create_category_link(&self, link: CategoryLink) -> Result<CategoryLink, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.category_links.iter().any(|l| {
            l.channel_id == link.channel_id
                && (l.remote_id == link.remote_id || l.category_id == link.category_id)
        }) {
            return Err(StoreError::Conflict(format!(
                "category {} already linked",
                link.remote_id
            )));
        }
        inner.category_links.push(link);
        Ok(link)
    }

    async fn product(&self, product: ProductId) -> Result<Product, StoreError> {
        let inner = self.inner.read().await;
        inner
            .products
            .iter()
            .find(|p| p.id == product)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn create_product(&self, input: CreateProductInput) -> Result<Product, StoreError> {
        let mut inner = self.inner.write().await;
        if inner
            .listings
            .iter()
            .any(|l| l.channel_id == input.channel_id && l.remote_id == input.remote_id)
        {
            return Err(StoreError::Conflict(format!(
                "remote product {} already listed",
                input.remote_id
            )));
        }
        let product_id = ProductId::new(inner.next_id());
        let listing_id = ListingId::new(inner.next_id());
        let product = Product {
            id: product_id,
            name: input.name,
            code: input.code,
            description: input.description,
            category_id: input.category_id,
            list_price: input.list_price,
            cost_price: input.cost_price,
            uom: input.uom,
            account_expense: input.account_expense,
            account_revenue: input.account_revenue,
            salable: input.salable,
        };
        inner.products.push(product.clone());
        inner.listings.push(Listing {
            id: listing_id,
            channel_id: input.channel_id,
            product_id,
            remote_id: input.remote_id,
            product_type: input.product_type,
        });
        Ok(product)
    }

    async fn update_product(&self, product: &Product) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let row = inner
            .products
            .iter_mut()
            .find(|p| p.id == product.id)
            .ok_or(StoreError::NotFound)?;
        *row = product.clone();
        Ok(())
    }

    async fn listing(
        &self,
        channel: ChannelId,
        remote: RemoteId,
    ) -> Result<Option<Listing>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .listings
            .iter()
            .find(|l| l.channel_id == channel && l.remote_id == remote)
            .cloned())
    }

    async fn listing_for_product(
        &self,
        channel: ChannelId,
        product: ProductId,
    ) -> Result<Option<Listing>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .listings
            .iter()
            .find(|l| l.channel_id == channel && l.product_id == product)
            .cloned())
    }

    async fn listings(&self, channel: ChannelId) -> Result<Vec<Listing>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .listings
            .iter()
            .filter(|l| l.channel_id == channel)
            .cloned()
            .collect())
    }

    async fn create_listing(&self, input: CreateListingInput) -> Result<Listing, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.listings.iter().any(|l| {
            l.channel_id == input.channel_id
                && (l.remote_id == input.remote_id || l.product_id == input.product_id)
        }) {
            return Err(StoreError::Conflict(format!(
                "remote product {} already listed",
                input.remote_id
            )));
        }
        let id = inner.next_id();
        let listing = Listing {
            id: ListingId::new(id),
            channel_id: input.channel_id,
            product_id: input.product_id,
            remote_id: input.remote_id,
            product_type: input.product_type,
        };
        inner.listings.push(listing.clone());
        Ok(listing)
    }

    async fn price_list(&self, list: PriceListId) -> Result<PriceList, StoreError> {
        let inner = self.inner.read().await;
        inner
            .price_lists
            .iter()
            .find(|p| p.id == list)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn product_tiers(&self, product: ProductId) -> Result<Vec<PriceTier>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.product_tiers.get(&product).cloned().unwrap_or_default())
    }

    async fn store_tiers(&self, store: StoreId) -> Result<Vec<PriceTier>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.store_tiers.get(&store).cloned().unwrap_or_default())
    }

    async fn quantity_on_hand(&self, product: ProductId) -> Result<Decimal, StoreError> {
        let inner = self.inner.read().await;
        let storage: HashSet<StockLocationId> = inner
            .locations
            .iter()
            .filter(|l| l.kind == LocationKind::Storage)
            .map(|l| l.id)
            .collect();
        Ok(inner
            .stock
            .iter()
            .filter(|s| s.product_id == product && storage.contains(&s.location_id))
            .map(|s| s.quantity)
            .sum())
    }

    async fn order_states(&self, channel: ChannelId) -> Result<Vec<OrderStateRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .order_states
            .iter()
            .filter(|s| s.channel_id == channel)
            .cloned()
            .collect())
    }

    async fn order_state_by_code(
        &self,
        channel: ChannelId,
        code: &str,
    ) -> Result<Option<OrderStateRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .order_states
            .iter()
            .find(|s| s.channel_id == channel && s.code == code)
            .cloned())
    }

    async fn create_order_state(
        &self,
        input: CreateOrderStateInput,
    ) -> Result<OrderStateRecord, StoreError> {
        let mut inner = self.inner.write().await;
        if inner
            .order_states
            .iter()
            .any(|s| s.channel_id == input.channel_id && s.code == input.code)
        {
            return Err(StoreError::Conflict(format!(
                "duplicate order state code {}",
                input.code
            )));
        }
        let id = inner.next_id();
        let state = OrderStateRecord {
            id: OrderStateId::new(id),
            channel_id: input.channel_id,
            code: input.code,
            name: input.name,
            import_eligible: input.import_eligible,
        };
        inner.order_states.push(state.clone());
        Ok(state)
    }

    async fn carrier(&self, carrier: CarrierId) -> Result<CarrierRecord, StoreError> {
        let inner = self.inner.read().await;
        inner
            .carriers
            .iter()
            .find(|c| c.id == carrier)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn carrier_by_code(
        &self,
        channel: ChannelId,
        code: &str,
    ) -> Result<Option<CarrierRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .carriers
            .iter()
            .find(|c| c.channel_id == channel && c.code == code)
            .cloned())
    }

    async fn create_carrier(&self, input: CreateCarrierInput) -> Result<CarrierRecord, StoreError> {
        let mut inner = self.inner.write().await;
        if inner
            .carriers
            .iter()
            .any(|c| c.channel_id == input.channel_id && c.code == input.code)
        {
            return Err(StoreError::Conflict(format!(
                "duplicate carrier code {}",
                input.code
            )));
        }
        let id = inner.next_id();
        let carrier = CarrierRecord {
            id: CarrierId::new(id),
            channel_id: input.channel_id,
            code: input.code,
            title: input.title,
        };
        inner.carriers.push(carrier.clone());
        Ok(carrier)
    }

    async fn order_by_reference(
        &self,
        channel: ChannelId,
        reference: &str,
    ) -> Result<Option<Order>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .orders
            .iter()
            .find(|o| o.channel_id == channel && o.reference == reference)
            .cloned())
    }

    async fn create_order(&self, input: CreateOrderInput) -> Result<Order, StoreError> {
        let mut inner = self.inner.write().await;
        if inner
            .orders
            .iter()
            .any(|o| o.channel_id == input.channel_id && o.reference == input.reference)
        {
            return Err(StoreError::Conflict(format!(
                "duplicate order reference {}",
                input.reference
            )));
        }
        let order_id = OrderId::new(inner.next_id());
        let lines = input
            .lines
            .into_iter()
            .map(|line| OrderLine {
                id: OrderLineId::new(inner.next_id()),
                product_id: line.product_id,
                remote_line_id: line.remote_line_id,
                description: line.description,
                quantity: line.quantity,
                unit_price: line.unit_price,
                taxes: line.taxes,
            })
            .collect();
        let order = Order {
            id: order_id,
            channel_id: input.channel_id,
            store_view_id: input.store_view_id,
            reference: input.reference,
            remote_id: input.remote_id,
            state: input.state,
            fulfillment_state: FulfillmentState::None,
            updated_at: Utc::now(),
            lines,
        };
        inner.orders.push(order.clone());
        Ok(order)
    }

    async fn orders(
        &self,
        view: StoreViewId,
        filter: &OrderFilter,
    ) -> Result<Vec<Order>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .orders
            .iter()
            .filter(|o| {
                o.store_view_id == view
                    && filter.modified_since.is_none_or(|ts| o.updated_at >= ts)
                    && filter
                        .fulfillment_state
                        .is_none_or(|fs| o.fulfillment_state == fs)
                    && (!filter.has_remote_id || o.remote_id.is_some())
                    && (!filter.has_shipments
                        || inner.shipments.iter().any(|s| s.order_id == o.id))
            })
            .cloned()
            .collect())
    }

    async fn shipments_for_order(&self, order: OrderId) -> Result<Vec<Shipment>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .shipments
            .iter()
            .filter(|s| s.order_id == order)
            .cloned()
            .collect())
    }

    async fn update_shipment(&self, shipment: &Shipment) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let row = inner
            .shipments
            .iter_mut()
            .find(|s| s.id == shipment.id)
            .ok_or(StoreError::NotFound)?;
        *row = shipment.clone();
        Ok(())
    }

    async fn watermark(
        &self,
        scope: SyncScope,
        kind: WatermarkKind,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.watermarks.get(&(scope, kind)).copied())
    }

    async fn set_watermark(
        &self,
        scope: SyncScope,
        kind: WatermarkKind,
        mark: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.watermarks.insert((scope, kind), mark);
        Ok(())
    }

    async fn record_issue(&self, input: CreateIssueInput) -> Result<SyncIssue, StoreError> {
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        let issue = SyncIssue {
            id: IssueId::new(id),
            origin: input.origin,
            log: input.log,
            recorded_at: Utc::now(),
        };
        inner.issues.push(issue.clone());
        Ok(issue)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product_input(
        channel: ChannelId,
        remote: RemoteId,
        category: CategoryId,
    ) -> CreateProductInput {
        CreateProductInput {
            name: "Widget".to_string(),
            code: Some("WID-1".to_string()),
            description: None,
            category_id: category,
            list_price: Decimal::new(1999, 2),
            cost_price: Decimal::new(1200, 2),
            uom: "Unit".to_string(),
            account_expense: "Main Expense".to_string(),
            account_revenue: "Main Revenue".to_string(),
            salable: true,
            channel_id: channel,
            remote_id: remote,
            product_type: "simple".to_string(),
        }
    }

    #[tokio::test]
    async fn test_seeds_unclassified_category() {
        let store = MemoryStore::new();
        let found = store
            .category_by_name(UNCLASSIFIED_CATEGORY)
            .await
            .unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_create_product_conflicts_on_duplicate_remote_id() {
        let store = MemoryStore::new();
        let channel = ChannelId::new(1);
        let category = store
            .category_by_name(UNCLASSIFIED_CATEGORY)
            .await
            .unwrap()
            .unwrap();

        store
            .create_product(product_input(channel, RemoteId::new(7), category.id))
            .await
            .unwrap();
        let err = store
            .create_product(product_input(channel, RemoteId::new(7), category.id))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // The losing create must leave no orphan product behind.
        assert_eq!(store.listings(channel).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_order_filter_criteria() {
        let store = MemoryStore::new();
        let channel = ChannelId::new(1);
        let view = StoreViewId::new(10);

        let kept = store
            .create_order(CreateOrderInput {
                channel_id: channel,
                store_view_id: view,
                reference: "mag_100".to_string(),
                remote_id: Some(RemoteId::new(100)),
                state: OrderWorkflowState::Confirmed,
                lines: Vec::new(),
            })
            .await
            .unwrap();
        store
            .create_order(CreateOrderInput {
                channel_id: channel,
                store_view_id: view,
                reference: "local_1".to_string(),
                remote_id: None,
                state: OrderWorkflowState::Draft,
                lines: Vec::new(),
            })
            .await
            .unwrap();

        let filter = OrderFilter {
            has_remote_id: true,
            ..OrderFilter::default()
        };
        let found = store.orders(view, &filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found.first().unwrap().id, kept.id);
    }

    #[tokio::test]
    async fn test_quantity_on_hand_counts_storage_locations_only() {
        let store = MemoryStore::new();
        let category = store
            .category_by_name(UNCLASSIFIED_CATEGORY)
            .await
            .unwrap()
            .unwrap();
        let product = store
            .insert_unlisted_product("Widget", Some("WID-1"), category.id, Decimal::TEN)
            .await;

        let shelf = store.insert_location("Shelf A", LocationKind::Storage).await;
        let shelf_b = store.insert_location("Shelf B", LocationKind::Storage).await;
        let customers = store
            .insert_location("Customers", LocationKind::Customer)
            .await;

        store.set_stock(shelf.id, product.id, Decimal::from(4)).await;
        store
            .set_stock(shelf_b.id, product.id, Decimal::from(6))
            .await;
        store
            .set_stock(customers.id, product.id, Decimal::from(99))
            .await;

        let qty = store.quantity_on_hand(product.id).await.unwrap();
        assert_eq!(qty, Decimal::from(10));
    }
}
